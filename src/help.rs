//! Usage, help and version text generation.

use std::fmt::Write;

use crate::parser::ArgumentParser;
use crate::switch::Switch;

/// Generate the usage line. A configured usage string wins; otherwise one is
/// derived from the program name.
pub fn generate_usage(parser: &ArgumentParser) -> String {
    if !parser.usage_text().is_empty() {
        return format!("Usage: {}\n", parser.usage_text());
    }
    let program = match parser.program_name() {
        "" => "program",
        name => name,
    };
    format!("Usage: {} [options] [arguments]\n", program)
}

/// Generate the version string, e.g. `myprogram 1.2.0`.
pub fn generate_version(parser: &ArgumentParser) -> String {
    let mut version = match parser.program_name() {
        "" => "program".to_string(),
        name => name.to_string(),
    };
    if !parser.version_text().is_empty() {
        version.push(' ');
        version.push_str(parser.version_text());
    }
    version.push('\n');
    version
}

/// Generate the full help text: the usage line followed by one aligned
/// section per switch group, the unnamed group first under "Options:".
pub fn generate_help(parser: &ArgumentParser) -> String {
    let mut help = generate_usage(parser);

    for (group, switches) in parser.switches().groups() {
        if switches.is_empty() {
            continue;
        }
        help.push('\n');
        if group.is_empty() {
            help.push_str("Options:\n");
        } else {
            let _ = writeln!(help, "{} options:", group);
        }

        let labels: Vec<String> = switches.iter().map(invocation_label).collect();
        let width = labels.iter().map(String::len).max().unwrap_or(0);
        for (switch, label) in switches.iter().zip(&labels) {
            let _ = write!(help, "  {:<width$}", label, width = width);
            if !switch.help_text().is_empty() {
                let _ = write!(help, "  {}", switch.help_text());
            }
            if !switch.choices().is_empty() {
                let _ = write!(help, "  [choices: {}]", switch.choices().join(", "));
            }
            help.push('\n');
        }
    }
    help
}

// "-f, --foo <VALUE>" for a switch with a short flag and a required
// argument, "    --bar" for a long-only flag.
fn invocation_label(switch: &Switch) -> String {
    let mut label = match switch.short_flag() {
        Some(flag) => format!("-{}, ", flag),
        None => "    ".to_string(),
    };
    let names: Vec<String> = switch
        .names()
        .iter()
        .map(|name| format!("--{}", name))
        .collect();
    label.push_str(&names.join(", "));
    if switch.action().requires_argument() {
        label.push_str(" <VALUE>");
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::Switch;

    fn parser() -> ArgumentParser {
        let mut parser = ArgumentParser::new();
        parser
            .program("myprogram")
            .version("2.1.0")
            .add_switch(Switch::new("verbose").short('v').help("Enable verbose output"))
            .add_switch(
                Switch::new("output")
                    .short('o')
                    .store()
                    .help("Output file"),
            )
            .add_switch(
                Switch::new("format")
                    .store()
                    .choice("json")
                    .choice("text")
                    .help("Output format"),
            );
        parser
    }

    #[test]
    fn test_derived_usage_line() {
        assert_eq!(
            generate_usage(&parser()),
            "Usage: myprogram [options] [arguments]\n"
        );
    }

    #[test]
    fn test_configured_usage_wins() {
        let mut parser = parser();
        parser.usage("myprogram [options] FILE");
        assert_eq!(
            generate_usage(&parser),
            "Usage: myprogram [options] FILE\n"
        );
    }

    #[test]
    fn test_generate_version() {
        assert_eq!(generate_version(&parser()), "myprogram 2.1.0\n");

        let mut unversioned = ArgumentParser::new();
        unversioned.program("myprogram");
        assert_eq!(generate_version(&unversioned), "myprogram\n");
    }

    #[test]
    fn test_help_lists_switches() {
        let help = generate_help(&parser());
        assert!(help.starts_with("Usage: myprogram"));
        assert!(help.contains("Options:\n"));
        assert!(help.contains("-v, --verbose"));
        assert!(help.contains("-o, --output <VALUE>"));
        assert!(help.contains("Enable verbose output"));
        assert!(help.contains("[choices: json, text]"));
    }

    #[test]
    fn test_help_columns_are_aligned() {
        let help = generate_help(&parser());
        let column = |needle: &str| {
            help.lines()
                .find_map(|line| line.find(needle))
                .unwrap()
        };
        assert_eq!(column("Enable verbose"), column("Output file"));
        assert_eq!(column("Output file"), column("Output format"));
    }

    #[test]
    fn test_named_groups_get_their_own_section() {
        let mut parser = parser();
        let mut set = parser.switches().clone();
        set.insert_grouped("server", Switch::new("port").store().help("Listen port"));
        parser.switch_set(set);

        let help = generate_help(&parser);
        assert!(help.contains("server options:\n"));
        assert!(help.contains("--port <VALUE>"));
    }

    #[test]
    fn test_aliases_are_listed() {
        let mut parser = ArgumentParser::new();
        parser.add_switch(Switch::new("foo").alias("foobar").store());
        let help = generate_help(&parser);
        assert!(help.contains("--foo, --foobar <VALUE>"));
    }
}
