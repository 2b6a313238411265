//! Versioned CLI tables: the arguments each engine expects and how its output reads.

use crate::parser::{Extractor, FieldRule, Locator, OutputGrammar};

pub const FIELD_VERSION: &str = "version";
pub const FIELD_DATABASE_DATE: &str = "database_date";
pub const FIELD_LAST_UPDATE_DATE: &str = "last_update_date";
pub const FIELD_DATABASE_STATE: &str = "database_state";
pub const FIELD_DATABASE_RECORDS: &str = "database_record_count";
pub const FIELD_DETECTION: &str = "detection";

#[derive(Debug, Clone, Copy)]
pub struct Invocation {
    pub args: &'static [&'static str],
    pub grammar: OutputGrammar,
}

impl Invocation {
    pub fn args(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CliDialect {
    pub engine: &'static str,
    pub format_version: u32,
    pub program_version: Invocation,
    pub database_version: Option<Invocation>,
    /// Arguments preceding the file path.
    pub scan_args: &'static [&'static str],
    /// Exact output line meaning one threat was found.
    pub threat_marker: &'static str,
    /// Clears the statistics the engine accumulates across scans.
    pub reset_stats: Option<&'static [&'static str]>,
    pub detection: Invocation,
}

impl CliDialect {
    pub fn scan_args(&self, path: &str) -> Vec<String> {
        let mut args: Vec<String> = self.scan_args.iter().map(|a| a.to_string()).collect();
        args.push(path.to_string());
        args
    }

    pub fn reset_args(&self) -> Option<Vec<String>> {
        self.reset_stats
            .map(|args| args.iter().map(|a| a.to_string()).collect())
    }
}

pub const KAV4FS_BINARY: &str = "/opt/kaspersky/kav4fs/bin/kav4fs-control";

const KAV4FS_VERSION_RULES: &[FieldRule] = &[FieldRule::new(
    FIELD_VERSION,
    Locator::Contains("Version:"),
    Extractor::AfterMarker,
)];

const KAV4FS_DATABASE_RULES: &[FieldRule] = &[
    FieldRule::new(
        FIELD_DATABASE_DATE,
        Locator::Contains("Current AV databases date"),
        Extractor::AfterFirstColon,
    ),
    FieldRule::new(
        FIELD_LAST_UPDATE_DATE,
        Locator::Contains("Last AV databases update date"),
        Extractor::AfterFirstColon,
    ),
    FieldRule::new(
        FIELD_DATABASE_STATE,
        Locator::Contains("Current AV databases state"),
        Extractor::AfterFirstColon,
    ),
    FieldRule::new(
        FIELD_DATABASE_RECORDS,
        Locator::Contains("Current AV databases records"),
        Extractor::AfterFirstColon,
    ),
];

const KAV4FS_DETECTION_RULES: &[FieldRule] = &[FieldRule::new(
    FIELD_DETECTION,
    Locator::Line(1),
    Extractor::AfterFirstColon,
)];

// /opt/kaspersky/kav4fs/bin/kav4fs-control --scan-file locky
// Objects scanned:     1
// Threats found:       1
// Riskware found:      0
// ...
//
// /opt/kaspersky/kav4fs/bin/kav4fs-control --top-viruses 1
// Viruses found: 1
// Virus name:       Trojan-Ransom.Win32.Locky.d
// Infected objects: 1
pub const KAV4FS_V8: CliDialect = CliDialect {
    engine: "kaspersky",
    format_version: 8,
    program_version: Invocation {
        args: &["-S", "--app-info"],
        grammar: OutputGrammar::new(KAV4FS_VERSION_RULES),
    },
    database_version: Some(Invocation {
        args: &["--get-stat", "Update"],
        grammar: OutputGrammar::new(KAV4FS_DATABASE_RULES),
    }),
    scan_args: &["--scan-file"],
    threat_marker: "Threats found:       1",
    reset_stats: Some(&["--clean-stat"]),
    detection: Invocation {
        args: &["--top-viruses", "1"],
        grammar: OutputGrammar::new(KAV4FS_DETECTION_RULES),
    },
};
