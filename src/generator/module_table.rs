//! Module table parsing
//!
//! The unpack tool dumps the game's module table as property text, one
//! `module.<index>.<field> = value` line per field. Indices group the lines
//! into entries; an entry without an id or a name is useless downstream and
//! is dropped with a warning.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub id: u32,
    pub name: String,
    pub chara: String,
    pub cos: Option<String>,
}

#[derive(Default)]
struct PartialEntry {
    id: Option<u32>,
    name: Option<String>,
    chara: Option<String>,
    cos: Option<String>,
}

/// Parse one property-text table. Unknown fields are ignored so newer game
/// data does not break older tool versions.
pub fn parse_table(text: &str) -> Vec<ModuleEntry> {
    let mut partials: BTreeMap<u64, PartialEntry> = BTreeMap::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        let Some(rest) = key.strip_prefix("module.") else {
            continue;
        };
        let Some((index, field)) = rest.split_once('.') else {
            continue;
        };
        let Ok(index) = index.parse::<u64>() else {
            continue;
        };

        let entry = partials.entry(index).or_default();
        match field {
            "id" => entry.id = value.parse().ok(),
            "name" => entry.name = Some(value.to_string()),
            "chara" => entry.chara = Some(value.to_string()),
            "cos" => entry.cos = Some(value.to_string()),
            _ => debug!(field = %field, "Ignoring unknown module field"),
        }
    }

    let mut modules = Vec::with_capacity(partials.len());
    for (index, partial) in partials {
        match (partial.id, partial.name) {
            (Some(id), Some(name)) => modules.push(ModuleEntry {
                id,
                name,
                chara: partial.chara.unwrap_or_default(),
                cos: partial.cos,
            }),
            _ => warn!(index, "Skipping module entry without id or name"),
        }
    }
    modules
}

/// Parse every `.txt` table in the extraction directory.
pub fn scan_extracted_dir(dir: &Path) -> Result<Vec<ModuleEntry>> {
    let mut modules = Vec::new();
    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read extraction directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")))
        .collect();
    files.sort();

    for path in files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module table {}", path.display()))?;
        let parsed = parse_table(&text);
        debug!(file = %path.display(), count = parsed.len(), "Parsed module table");
        modules.extend(parsed);
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
module.0.id = 437
module.0.name = Miku Classic
module.0.chara = MIKU
module.0.cos = COS_437
module.1.id = 500
module.1.name = Rin Future
module.1.chara = RIN
";

    #[test]
    fn test_parse_basic_table() {
        let modules = parse_table(SAMPLE);
        assert_eq!(modules.len(), 2);
        assert_eq!(
            modules[0],
            ModuleEntry {
                id: 437,
                name: "Miku Classic".to_string(),
                chara: "MIKU".to_string(),
                cos: Some("COS_437".to_string()),
            }
        );
        assert_eq!(modules[1].chara, "RIN");
        assert_eq!(modules[1].cos, None);
    }

    #[test]
    fn test_parse_skips_incomplete_entries() {
        let text = "\
module.0.name = No Id Here
module.1.id = 7
module.2.id = 8
module.2.name = Complete
module.2.chara = TETO
";
        let modules = parse_table(text);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, 8);
        assert_eq!(modules[0].chara, "TETO");
    }

    #[test]
    fn test_parse_ignores_noise() {
        let text = "\
# comment line
not a property
other.0.id = 1
module.x.id = 2
module.3.unknown_field = y
module.3.id = 3
module.3.name = Ok
";
        let modules = parse_table(text);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, 3);
    }

    #[test]
    fn test_parse_orders_by_index() {
        let text = "\
module.5.id = 50
module.5.name = Later
module.1.id = 10
module.1.name = Earlier
";
        let modules = parse_table(text);
        assert_eq!(modules[0].name, "Earlier");
        assert_eq!(modules[1].name, "Later");
    }

    #[test]
    fn test_scan_extracted_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gm_module_tbl.txt"), SAMPLE).unwrap();
        fs::write(dir.path().join("ignored.bin"), b"\x00").unwrap();

        let modules = scan_extracted_dir(dir.path()).unwrap();
        assert_eq!(modules.len(), 2);
    }
}
