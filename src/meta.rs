use std::io::Write;

/// Version of this runtime, in the grammar tool's numbering scheme.
pub const VERSION: &str = "4.13.1";

/// Version handshake between the code generator, the generated artifacts
/// and this runtime.
///
/// Generated recognizers call [`check_version`](RuntimeMetaData::check_version)
/// during initialization with the version of the tool that generated them
/// and the runtime version they were compiled against. Differences in the
/// major.minor part produce one warning line each on standard error; patch
/// and suffix differences are benign.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeMetaData;

impl RuntimeMetaData {
    pub fn check_version(generating_tool_version: &str, compile_time_version: &str) {
        let _ = Self::check_version_to(
            &mut std::io::stderr(),
            generating_tool_version,
            compile_time_version,
        );
    }

    fn check_version_to<W: Write>(
        out: &mut W,
        generating_tool_version: &str,
        compile_time_version: &str,
    ) -> std::io::Result<()> {
        let runtime = Self::major_minor(VERSION);
        if Self::major_minor(generating_tool_version) != runtime {
            writeln!(
                out,
                "Tool version {} used for code generation does not match the current runtime version {}",
                generating_tool_version, VERSION
            )?;
        }
        if Self::major_minor(compile_time_version) != runtime {
            writeln!(
                out,
                "Runtime version {} used for parser compilation does not match the current runtime version {}",
                compile_time_version, VERSION
            )?;
        }
        Ok(())
    }

    /// The `major.minor` prefix of a version literal: everything up to the
    /// second dot or the first suffix marker, whichever comes first.
    pub fn major_minor(version: &str) -> &str {
        let mut end = version.len();
        let mut dots = 0;
        for (index, c) in version.char_indices() {
            match c {
                '.' => {
                    dots += 1;
                    if dots == 2 {
                        end = index;
                        break;
                    }
                }
                '-' | '+' => {
                    end = index;
                    break;
                }
                _ => {}
            }
        }
        &version[..end]
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn major_minor_prefixes() {
        assert_eq!(RuntimeMetaData::major_minor("4.13.1"), "4.13");
        assert_eq!(RuntimeMetaData::major_minor("4.13"), "4.13");
        assert_eq!(RuntimeMetaData::major_minor("4.13-SNAPSHOT"), "4.13");
        assert_eq!(RuntimeMetaData::major_minor("4.13.1+build.7"), "4.13");
    }

    #[test]
    fn matching_major_minor_is_silent() {
        // Patch-level differences on both sides are benign.
        let mut out = Vec::new();
        RuntimeMetaData::check_version_to(&mut out, "4.13.0", "4.13.9").unwrap();
        assert!(out.is_empty(), "unexpected warning: {:?}", out);
    }

    #[test]
    fn minor_mismatch_warns_once_per_side() {
        let mut out = Vec::new();
        RuntimeMetaData::check_version_to(&mut out, "4.12.0", "4.13.1").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1, "unexpected output: {}", text);
        assert!(
            text.contains("Tool version 4.12.0")
                && text.contains("does not match the current runtime version 4.13.1"),
            "unexpected warning: {}",
            text
        );

        let mut out = Vec::new();
        RuntimeMetaData::check_version_to(&mut out, "4.13.0", "4.12.2").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1, "unexpected output: {}", text);
        assert!(
            text.contains("Runtime version 4.12.2"),
            "unexpected warning: {}",
            text
        );
    }
}
