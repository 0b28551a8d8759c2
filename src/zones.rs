//! Zone discovery via the host inventory utility.
//!
//! `zoneadm list -p` prints one colon-delimited line per running zone:
//!
//! ```text
//! 0:global:running:/::liveimg:shared:0
//! 3:a1b2c3d4-...:running:/zones/a1b2c3d4-...:a1b2c3d4-...:joyent-minimal:excl:3
//! ```
//!
//! Field 0 is the zone id and field 4 the zone UUID.

use ahash::AHashMap as HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::catalog::MetricCatalog;
use crate::collectors::{run_command, Sources};
use crate::error::Result;
use crate::instrumenter::ZoneInstrumenter;

/// Zone id of the global zone, which is never instrumented.
pub const GLOBAL_ZONE_ID: i64 = 0;

const ID_FIELD: usize = 0;
const UUID_FIELD: usize = 4;

/// A discovered zone and its collector.
#[derive(Debug)]
pub struct Zone {
    pub instance: u32,
    pub instrumenter: Arc<ZoneInstrumenter>,
}

/// Program and arguments used to list running zones.
#[derive(Debug, Clone)]
pub struct InventoryCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InventoryCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn zoneadm(path: impl Into<String>) -> Self {
        Self::new(path, vec!["list".to_string(), "-p".to_string()])
    }
}

impl Default for InventoryCommand {
    fn default() -> Self {
        Self::zoneadm("/usr/sbin/zoneadm")
    }
}

/// A non-global zone line from the inventory output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub instance: i64,
    pub identity: String,
}

/// Parses inventory output, skipping the global zone and malformed lines.
///
/// A line is malformed when its id is not an integer, it has fewer than five
/// fields, or its identity field is empty.
pub fn parse_zone_list(output: &str) -> Vec<ZoneEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(':').collect();
        let instance = match fields[ID_FIELD].parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                warn!("Skipping inventory line with invalid zone id: {}", line);
                continue;
            }
        };

        if instance <= GLOBAL_ZONE_ID {
            continue;
        }

        match fields.get(UUID_FIELD).map(|s| s.trim()) {
            Some(identity) if !identity.is_empty() => entries.push(ZoneEntry {
                instance,
                identity: identity.to_string(),
            }),
            _ => warn!("Skipping inventory line without zone identity: {}", line),
        }
    }

    entries
}

/// Lists running zones and builds one instrumenter per zone.
pub struct ZoneEnumerator {
    command: InventoryCommand,
    catalog: Arc<MetricCatalog>,
    sources: Sources,
}

impl ZoneEnumerator {
    pub fn new(command: InventoryCommand, catalog: Arc<MetricCatalog>, sources: Sources) -> Self {
        Self {
            command,
            catalog,
            sources,
        }
    }

    /// Runs the inventory utility and returns identity -> zone.
    ///
    /// Fails with `Execution` when the utility cannot run or exits non-zero.
    #[instrument(skip(self), fields(program = %self.command.program))]
    pub fn enumerate(&self) -> Result<HashMap<String, Zone>> {
        let stdout = run_command(&self.command.program, &self.command.args)?;
        let mut zones = HashMap::new();

        for entry in parse_zone_list(&stdout) {
            match ZoneInstrumenter::new(
                &entry.identity,
                entry.instance,
                self.catalog.clone(),
                self.sources.clone(),
            ) {
                Ok(instrumenter) => {
                    let instance = instrumenter.instance().get();
                    zones.insert(
                        entry.identity,
                        Zone {
                            instance,
                            instrumenter: Arc::new(instrumenter),
                        },
                    );
                }
                Err(e) => warn!("Skipping zone {}: {}", entry.identity, e),
            }
        }

        debug!("Discovered {} zones", zones.len());
        Ok(zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONEADM_OUTPUT: &str = "0:global:running:/::liveimg:shared:0\n\
3:aaaa:running:/zones/aaaa:aaaa-uuid:joyent-minimal:excl:3\n\
7:bbbb:running:/zones/bbbb:bbbb-uuid:lx:excl:7\n";

    #[test]
    fn test_parse_skips_global_zone() {
        let entries = parse_zone_list(ZONEADM_OUTPUT);
        assert_eq!(
            entries,
            vec![
                ZoneEntry {
                    instance: 3,
                    identity: "aaaa-uuid".into()
                },
                ZoneEntry {
                    instance: 7,
                    identity: "bbbb-uuid".into()
                },
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let output = "x:bad:running:/:uuid-x:b:c:0\n\
5:short:running\n\
6:empty:running:/zones/e::b:c:6\n\
\n\
9:ok:running:/zones/ok:ok-uuid:b:c:9\n";
        let entries = parse_zone_list(output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identity, "ok-uuid");
        assert_eq!(entries[0].instance, 9);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_zone_list("").is_empty());
        assert!(parse_zone_list("0:global:running:/::liveimg:shared:0\n").is_empty());
    }

    #[test]
    fn test_zoneadm_command_args() {
        let cmd = InventoryCommand::zoneadm("/usr/sbin/zoneadm");
        assert_eq!(cmd.args, vec!["list", "-p"]);
    }
}
