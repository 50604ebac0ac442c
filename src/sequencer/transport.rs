use crate::config::TPQN;

use super::song::{Note, Song};

/// A note due to fire on a track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub track: usize,
    pub note: Note,
}

/// Tick clock for the song loop.
///
/// The position is fractional so that small frame deltas accumulate
/// without drift. A note fires when its start tick falls in the window
/// the clock swept this frame, `[previous, current)`.
#[derive(Clone, Debug, Default)]
pub struct Transport {
    position: f64,
    playing: bool,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current position in ticks
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Halt the clock, keeping its position
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Halt and rewind to the loop start
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    pub fn toggle(&mut self) -> bool {
        if self.playing {
            self.stop();
        } else {
            self.play();
        }
        self.playing
    }

    pub fn ticks_per_ms(bpm: f32) -> f64 {
        bpm as f64 * TPQN as f64 / 60000.0
    }

    /// Move the clock forward by `dt_ms` and collect the notes it crossed.
    ///
    /// When the loop end is crossed the tail window is scanned first, then
    /// the clock wraps and the head window is scanned from zero.
    pub fn advance(&mut self, song: &Song, dt_ms: f64) -> Vec<Trigger> {
        let mut fired = Vec::new();
        if !self.playing || song.length_ticks == 0 || dt_ms <= 0.0 {
            return fired;
        }
        let length = song.length_ticks as f64;
        let mut prev = self.position;
        self.position += dt_ms * Self::ticks_per_ms(song.bpm);

        if self.position >= length {
            collect(song, prev, length, &mut fired);
            self.position %= length;
            prev = 0.0;
        }
        collect(song, prev, self.position, &mut fired);
        fired
    }
}

fn collect(song: &Song, start: f64, end: f64, out: &mut Vec<Trigger>) {
    for (track, t) in song.tracks.iter().enumerate() {
        for note in t.notes() {
            let tick = note.tick as f64;
            if start <= tick && tick < end {
                out.push(Trigger { track, note: *note });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_with(notes: &[(usize, u32)]) -> Song {
        let mut song = Song::new();
        for (track, tick) in notes {
            song.tracks[*track].add_note(Note::new(*tick, 60, 120, 100));
        }
        song
    }

    #[test]
    fn stopped_transport_fires_nothing() {
        let song = song_with(&[(0, 0)]);
        let mut transport = Transport::new();
        assert!(transport.advance(&song, 100.0).is_empty());
        assert_eq!(transport.position(), 0.0);
    }

    #[test]
    fn fires_notes_inside_the_window() {
        // 120 bpm: 0.96 ticks per ms
        let song = song_with(&[(0, 0), (1, 10), (2, 20)]);
        let mut transport = Transport::new();
        transport.play();
        let fired = transport.advance(&song, 12.5);
        assert_eq!(fired.iter().map(|t| t.track).collect::<Vec<_>>(), vec![0, 1]);
        let fired = transport.advance(&song, 12.5);
        assert_eq!(fired.iter().map(|t| t.track).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn wraps_with_tail_first() {
        let song = song_with(&[(0, 1910), (1, 0), (2, 5)]);
        let mut transport = Transport::new();
        transport.play();
        // land at 1900 ticks
        transport.advance(&song, 1900.0 / 0.96);
        let fired = transport.advance(&song, 30.0 / 0.96);
        let order: Vec<u32> = fired.iter().map(|t| t.note.tick).collect();
        assert_eq!(order, vec![1910, 0, 5]);
        assert!(transport.position() < 21.0);
    }

    #[test]
    fn pause_keeps_position() {
        let song = song_with(&[]);
        let mut transport = Transport::new();
        transport.play();
        transport.advance(&song, 100.0);
        transport.pause();
        assert!(!transport.is_playing());
        assert!((transport.position() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn stop_rewinds() {
        let song = song_with(&[]);
        let mut transport = Transport::new();
        transport.play();
        transport.advance(&song, 500.0);
        transport.stop();
        assert!(!transport.is_playing());
        assert_eq!(transport.position(), 0.0);
    }
}
