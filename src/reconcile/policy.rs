//! Monitoring policy.
//!
//! Both decisions are pure functions of their inputs.

use trailarr_common::{MonitorMode, MonitorStatus};

/// Whether a record should be monitored for a trailer download.
///
/// A record that already has a trailer is never monitored. Otherwise the
/// connection's mode decides: `missing` monitors everything, `new` only
/// records created this cycle, `sync` follows the source's own flag and
/// `none` nothing.
pub fn decide_monitor(
    is_new: bool,
    trailer_exists: bool,
    remote_monitored: bool,
    mode: MonitorMode,
) -> bool {
    if trailer_exists {
        return false;
    }
    match mode {
        MonitorMode::None => false,
        MonitorMode::Missing => true,
        MonitorMode::New => is_new,
        MonitorMode::Sync => remote_monitored,
    }
}

/// Next lifecycle status of a record.
///
/// `Downloading` is sticky; the downloader owns that transition.
pub fn decide_status(trailer_exists: bool, monitor: bool, current: MonitorStatus) -> MonitorStatus {
    if current == MonitorStatus::Downloading {
        return MonitorStatus::Downloading;
    }
    if trailer_exists {
        return MonitorStatus::Downloaded;
    }
    if monitor {
        return MonitorStatus::Monitored;
    }
    MonitorStatus::Missing
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [MonitorMode; 4] = [
        MonitorMode::Missing,
        MonitorMode::New,
        MonitorMode::None,
        MonitorMode::Sync,
    ];

    #[test]
    fn test_trailer_exists_never_monitors() {
        for mode in MODES {
            for is_new in [false, true] {
                for remote in [false, true] {
                    assert!(!decide_monitor(is_new, true, remote, mode));
                }
            }
        }
    }

    #[test]
    fn test_modes() {
        assert!(!decide_monitor(true, false, true, MonitorMode::None));
        assert!(decide_monitor(false, false, false, MonitorMode::Missing));
        assert!(decide_monitor(true, false, false, MonitorMode::New));
        assert!(!decide_monitor(false, false, true, MonitorMode::New));
        assert!(decide_monitor(false, false, true, MonitorMode::Sync));
        assert!(!decide_monitor(true, false, false, MonitorMode::Sync));
    }

    #[test]
    fn test_downloading_is_sticky() {
        assert_eq!(
            decide_status(false, false, MonitorStatus::Downloading),
            MonitorStatus::Downloading
        );
        assert_eq!(
            decide_status(true, true, MonitorStatus::Downloading),
            MonitorStatus::Downloading
        );
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(
            decide_status(true, true, MonitorStatus::Missing),
            MonitorStatus::Downloaded
        );
        assert_eq!(
            decide_status(false, true, MonitorStatus::Missing),
            MonitorStatus::Monitored
        );
        assert_eq!(
            decide_status(false, false, MonitorStatus::Monitored),
            MonitorStatus::Missing
        );
    }
}
