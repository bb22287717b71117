use serde::{Deserialize, Serialize};

/// Which coherence fabric a command verb belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vocabulary {
    Host,
    Device,
    /// Protocol markers understood on both sides of the link.
    Shared,
}

/// Command verbs of both coherence vocabularies.
///
/// A packet carries exactly one verb at a time; crossing the bridge
/// rewrites the verb into the opposite vocabulary where a translation
/// rule exists.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum Cmd {
    // host vocabulary
    ReadReq,
    ReadExReq,
    WriteReq,
    UpgradeReq,
    WriteLineReq,
    InvalidateReq,
    CleanEvict,
    WritebackDirty,
    ReadResp,
    // device vocabulary
    ReadSharedReq,
    ReadUniqueReq,
    WriteResp,
    WriteCleanResp,
    // end-of-transaction marker, valid in both vocabularies
    Go,
}

impl Cmd {
    #[must_use]
    pub fn vocabulary(self) -> Vocabulary {
        match self {
            Cmd::ReadReq
            | Cmd::ReadExReq
            | Cmd::WriteReq
            | Cmd::UpgradeReq
            | Cmd::WriteLineReq
            | Cmd::InvalidateReq
            | Cmd::CleanEvict
            | Cmd::WritebackDirty
            | Cmd::ReadResp => Vocabulary::Host,
            Cmd::ReadSharedReq | Cmd::ReadUniqueReq | Cmd::WriteResp | Cmd::WriteCleanResp => {
                Vocabulary::Device
            }
            Cmd::Go => Vocabulary::Shared,
        }
    }

    #[must_use]
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Cmd::ReadReq | Cmd::ReadExReq | Cmd::ReadSharedReq | Cmd::ReadUniqueReq
        )
    }

    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Cmd::WriteReq | Cmd::WriteLineReq | Cmd::WritebackDirty
        )
    }

    #[must_use]
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Cmd::ReadResp | Cmd::WriteResp | Cmd::WriteCleanResp
        )
    }

    /// Whether a peer accepting this command owes a response back.
    ///
    /// Writebacks and clean evictions are fire-and-forget; responses
    /// and markers never generate further responses.
    #[must_use]
    pub fn needs_response(self) -> bool {
        matches!(
            self,
            Cmd::ReadReq
                | Cmd::ReadExReq
                | Cmd::WriteReq
                | Cmd::UpgradeReq
                | Cmd::WriteLineReq
                | Cmd::InvalidateReq
                | Cmd::ReadSharedReq
                | Cmd::ReadUniqueReq
        )
    }

    /// Stable name, usable as a stats key.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Cmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::{Cmd, Vocabulary};
    use strum::IntoEnumIterator;

    #[test]
    fn test_vocabularies_are_disjoint() {
        for cmd in Cmd::iter() {
            match cmd.vocabulary() {
                Vocabulary::Shared => assert_eq!(cmd, Cmd::Go),
                Vocabulary::Host | Vocabulary::Device => {}
            }
        }
    }

    #[test]
    fn test_response_commands_never_need_responses() {
        for cmd in Cmd::iter().filter(|cmd| cmd.is_response()) {
            assert!(!cmd.needs_response(), "{cmd} is a response");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: std::collections::HashSet<_> = Cmd::iter().map(Cmd::name).collect();
        assert_eq!(names.len(), Cmd::iter().count());
    }
}
