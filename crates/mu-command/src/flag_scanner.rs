use std::collections::HashMap;

/// A group of flag aliases. The last entry is the canonical name results
/// are keyed by, e.g. `&["p", "project"]`.
pub(crate) type AliasGroup = &'static [&'static str];

#[derive(Debug, Default)]
pub(crate) struct ScannedFlags {
    values: HashMap<&'static str, Vec<String>>,
    switches: HashMap<&'static str, bool>,
    positionals: Vec<String>,
}

impl ScannedFlags {
    pub(crate) fn value(&self, canonical: &str) -> String {
        self.values
            .get(canonical)
            .and_then(|all| all.last())
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn values(&self, canonical: &str) -> Vec<String> {
        self.values.get(canonical).cloned().unwrap_or_default()
    }

    pub(crate) fn switch(&self, canonical: &str) -> bool {
        self.switches.get(canonical).copied().unwrap_or(false)
    }

    pub(crate) fn positionals(&self) -> &[String] {
        &self.positionals
    }
}

fn canonical_for(groups: &[AliasGroup], name: &str) -> Option<&'static str> {
    for group in groups {
        if group.iter().any(|alias| *alias == name) {
            return group.last().copied();
        }
    }
    None
}

fn parse_switch_value(raw: &str) -> Result<bool, String> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("invalid boolean value {other:?}")),
    }
}

/// Scans `-flag value`, `-flag=value` and `--flag` forms. Flag parsing
/// stops at the first token that does not look like a flag; the rest are
/// positional arguments. Unknown flags are an error.
pub(crate) fn scan_flags(
    tokens: &[String],
    string_flags: &[AliasGroup],
    switch_flags: &[AliasGroup],
) -> Result<ScannedFlags, String> {
    let mut scanned = ScannedFlags::default();
    let mut iter = tokens.iter().enumerate();
    while let Some((index, token)) = iter.next() {
        let stripped = token
            .strip_prefix("--")
            .or_else(|| token.strip_prefix('-'));
        let Some(stripped) = stripped.filter(|rest| !rest.is_empty()) else {
            scanned.positionals.extend(tokens[index..].iter().cloned());
            break;
        };
        let (name, inline_value) = match stripped.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (stripped, None),
        };
        if let Some(canonical) = canonical_for(switch_flags, name) {
            let enabled = match inline_value {
                Some(raw) => parse_switch_value(&raw)?,
                None => true,
            };
            scanned.switches.insert(canonical, enabled);
            continue;
        }
        let Some(canonical) = canonical_for(string_flags, name) else {
            return Err(format!("unknown flag -{name}"));
        };
        let value = match inline_value {
            Some(value) => value,
            None => match iter.next() {
                Some((_, next)) => next.clone(),
                None => return Err(format!("flag -{name} requires a value")),
            },
        };
        scanned.values.entry(canonical).or_default().push(value);
    }
    Ok(scanned)
}

/// Splits verb arguments at the first literal `--` token into the command
/// flag region and the terraform passthrough region.
pub(crate) fn split_at_passthrough(args: &[String]) -> (&[String], &[String]) {
    match args.iter().position(|token| token == "--") {
        Some(index) => (&args[..index], &args[index + 1..]),
        None => (args, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::{scan_flags, split_at_passthrough};

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn unit_scan_flags_reads_short_long_and_inline_forms() {
        let scanned = scan_flags(
            &tokens(&["-p", "core", "--workspace=dev"]),
            &[&["p", "project"], &["w", "workspace"]],
            &[],
        )
        .expect("scanned");
        assert_eq!(scanned.value("project"), "core");
        assert_eq!(scanned.value("workspace"), "dev");
    }

    #[test]
    fn functional_scan_flags_collects_repeated_values_and_switches() {
        let scanned = scan_flags(
            &tokens(&["-var", "a=1", "-var=b=2", "-destroy"]),
            &[&["var"]],
            &[&["destroy"]],
        )
        .expect("scanned");
        assert_eq!(scanned.values("var"), vec!["a=1", "b=2"]);
        assert!(scanned.switch("destroy"));
    }

    #[test]
    fn functional_scan_flags_stops_at_first_positional() {
        let scanned = scan_flags(
            &tokens(&["-p", "core", "module.a", "-w", "dev"]),
            &[&["p", "project"], &["w", "workspace"]],
            &[],
        )
        .expect("scanned");
        assert_eq!(scanned.value("project"), "core");
        assert_eq!(scanned.positionals(), &["module.a", "-w", "dev"]);
        assert_eq!(scanned.value("workspace"), "");
    }

    #[test]
    fn regression_scan_flags_rejects_unknown_and_valueless_flags() {
        assert!(scan_flags(&tokens(&["-bogus"]), &[&["p", "project"]], &[]).is_err());
        assert!(scan_flags(&tokens(&["-p"]), &[&["p", "project"]], &[]).is_err());
        assert!(scan_flags(&tokens(&["-destroy=maybe"]), &[], &[&["destroy"]]).is_err());
    }

    #[test]
    fn unit_split_at_passthrough_splits_on_first_double_dash() {
        let args = tokens(&["-p", "core", "--", "-var", "a=1", "--", "tail"]);
        let (command_flags, passthrough) = split_at_passthrough(&args);
        assert_eq!(command_flags, &args[..2]);
        assert_eq!(passthrough, &args[3..]);
    }

    #[test]
    fn unit_split_at_passthrough_returns_empty_passthrough_without_marker() {
        let args = tokens(&["-p", "core"]);
        let (command_flags, passthrough) = split_at_passthrough(&args);
        assert_eq!(command_flags, &args[..]);
        assert!(passthrough.is_empty());
    }
}
