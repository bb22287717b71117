use super::cmd::Cmd;
use serde::{Deserialize, Serialize};

/// Which way across the bridge a packet is traveling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::HostToDevice => write!(f, "host->device"),
            Direction::DeviceToHost => write!(f, "device->host"),
        }
    }
}

/// Result of translating one command verb.
///
/// `mapped` is false when no rule covers the input and it was passed
/// through unchanged; the caller surfaces that as an
/// untranslated-command event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub cmd: Cmd,
    pub mapped: bool,
}

impl Translation {
    fn mapped(cmd: Cmd) -> Self {
        Self { cmd, mapped: true }
    }

    fn pass_through(cmd: Cmd) -> Self {
        Self { cmd, mapped: false }
    }
}

/// Rewrite a command verb into the opposite vocabulary.
///
/// Total and pure: every verb yields an output, unmapped verbs pass
/// through unchanged (flagged), and nothing else about the packet is
/// touched.
#[must_use]
pub fn translate(cmd: Cmd, direction: Direction) -> Translation {
    match direction {
        Direction::HostToDevice => match cmd {
            Cmd::ReadReq => Translation::mapped(Cmd::ReadSharedReq),
            // every exclusive-acquiring request becomes a unique read
            Cmd::ReadExReq | Cmd::WriteReq | Cmd::UpgradeReq | Cmd::WriteLineReq => {
                Translation::mapped(Cmd::ReadUniqueReq)
            }
            // no device-side analog needed at this layer
            Cmd::InvalidateReq | Cmd::CleanEvict | Cmd::WritebackDirty => Translation::mapped(cmd),
            Cmd::Go => Translation::mapped(Cmd::Go),
            _ => Translation::pass_through(cmd),
        },
        Direction::DeviceToHost => match cmd {
            Cmd::WritebackDirty => Translation::mapped(Cmd::WriteResp),
            Cmd::CleanEvict => Translation::mapped(Cmd::WriteCleanResp),
            Cmd::ReadResp => Translation::mapped(Cmd::ReadResp),
            Cmd::Go => Translation::mapped(Cmd::Go),
            _ => Translation::pass_through(cmd),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{translate, Direction, Translation};
    use crate::cmd::Cmd;
    use strum::IntoEnumIterator;

    #[test]
    fn test_host_reads_become_shared_reads() {
        let out = translate(Cmd::ReadReq, Direction::HostToDevice);
        assert_eq!(out, Translation { cmd: Cmd::ReadSharedReq, mapped: true });
    }

    #[test]
    fn test_exclusive_acquiring_requests_become_unique_reads() {
        for cmd in [Cmd::ReadExReq, Cmd::WriteReq, Cmd::UpgradeReq, Cmd::WriteLineReq] {
            let out = translate(cmd, Direction::HostToDevice);
            assert_eq!(out.cmd, Cmd::ReadUniqueReq, "{cmd}");
            assert!(out.mapped);
        }
    }

    #[test]
    fn test_host_to_device_pass_through() {
        for cmd in [Cmd::InvalidateReq, Cmd::CleanEvict, Cmd::WritebackDirty, Cmd::Go] {
            let out = translate(cmd, Direction::HostToDevice);
            assert_eq!(out.cmd, cmd);
            assert!(out.mapped);
        }
    }

    #[test]
    fn test_device_to_host_writebacks() {
        assert_eq!(
            translate(Cmd::WritebackDirty, Direction::DeviceToHost).cmd,
            Cmd::WriteResp
        );
        assert_eq!(
            translate(Cmd::CleanEvict, Direction::DeviceToHost).cmd,
            Cmd::WriteCleanResp
        );
    }

    #[test]
    fn test_go_marker_is_identity_both_ways() {
        for direction in [Direction::HostToDevice, Direction::DeviceToHost] {
            let out = translate(Cmd::Go, direction);
            assert_eq!(out.cmd, Cmd::Go);
            assert!(out.mapped);
        }
    }

    #[test]
    fn test_read_response_is_identity() {
        let out = translate(Cmd::ReadResp, Direction::DeviceToHost);
        assert_eq!(out.cmd, Cmd::ReadResp);
        assert!(out.mapped);
    }

    #[test]
    fn test_unmapped_commands_pass_through_flagged() {
        // a device-vocabulary verb arriving on the host side has no rule
        let out = translate(Cmd::ReadSharedReq, Direction::HostToDevice);
        assert_eq!(out.cmd, Cmd::ReadSharedReq);
        assert!(!out.mapped);

        let out = translate(Cmd::ReadReq, Direction::DeviceToHost);
        assert_eq!(out.cmd, Cmd::ReadReq);
        assert!(!out.mapped);
    }

    #[test]
    fn test_translation_is_total() {
        for cmd in Cmd::iter() {
            for direction in [Direction::HostToDevice, Direction::DeviceToHost] {
                // must not panic, must yield some verb
                let _ = translate(cmd, direction);
            }
        }
    }
}
