//! What a playback event asks the service to do.

use shapegate_types::event::PlaybackEvent;

/// Action selected for one webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Cancel any pending disable and enable shaping now.
    Enable,
    /// Disable shaping after the configured delay.
    ScheduleDisable,
    /// Remote streams are still playing; leave shaping alone.
    SkipActiveStreams,
    /// Not a playback event we act on.
    Ignore,
}

/// Map an event and its WAN stream count to a decision.
///
/// A pause keeps shaping while more than one remote stream is active, a stop
/// while any remote stream is.
pub fn decide(event: &PlaybackEvent, wan_streams: i64) -> Decision {
    match event {
        PlaybackEvent::Start | PlaybackEvent::Resume => Decision::Enable,
        PlaybackEvent::Pause if wan_streams > 1 => Decision::SkipActiveStreams,
        PlaybackEvent::Stop if wan_streams >= 1 => Decision::SkipActiveStreams,
        PlaybackEvent::Pause | PlaybackEvent::Stop => Decision::ScheduleDisable,
        PlaybackEvent::Other(_) => Decision::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_resume_enable_regardless_of_streams() {
        for streams in [0, 1, 5] {
            assert_eq!(decide(&PlaybackEvent::Start, streams), Decision::Enable);
            assert_eq!(decide(&PlaybackEvent::Resume, streams), Decision::Enable);
        }
    }

    #[test]
    fn test_pause_threshold() {
        assert_eq!(decide(&PlaybackEvent::Pause, 0), Decision::ScheduleDisable);
        assert_eq!(decide(&PlaybackEvent::Pause, 1), Decision::ScheduleDisable);
        assert_eq!(decide(&PlaybackEvent::Pause, 2), Decision::SkipActiveStreams);
    }

    #[test]
    fn test_stop_threshold() {
        assert_eq!(decide(&PlaybackEvent::Stop, 0), Decision::ScheduleDisable);
        assert_eq!(decide(&PlaybackEvent::Stop, -1), Decision::ScheduleDisable);
        assert_eq!(decide(&PlaybackEvent::Stop, 1), Decision::SkipActiveStreams);
    }

    #[test]
    fn test_other_events_ignored() {
        let event = PlaybackEvent::Other("media_scanned".to_string());
        assert_eq!(decide(&event, 0), Decision::Ignore);
    }
}
