use crate::service::WinCategory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// Looping reel noise, started after the wager is debited.
    SpinStart,
    SpinStop,
    ReelStop(usize),
    Win(WinCategory),
}

/// Where cues go. Playback itself lives outside this crate.
pub trait AudioSink: Send + Sync {
    fn play(&self, cue: AudioCue);
}

/// Records cues in the log; the terminal client has no sound device.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&self, cue: AudioCue) {
        tracing::debug!(?cue, "audio cue");
    }
}
