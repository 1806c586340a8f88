use std::sync::OnceLock;

use regex::Regex;

/// Only this many leading lines are searched for a `# ... JMeter x.y` banner.
const BANNER_SCAN_LINES: usize = 10;

fn banner_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"JMeter\s+([vV]ersion\s*)?([0-9]+(\.[0-9]+)+(-[a-zA-Z0-9]+)?)")
            .expect("regex is valid")
    })
}

fn test_plan_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"test-plan\s+([vV]ersion\s*)?([0-9]+(\.[0-9]+)+(-[a-zA-Z0-9]+)?)")
            .expect("regex is valid")
    })
}

/// Find the JMeter version a result file was written with, if it says.
///
/// Looks for a comment line such as `# Apache JMeter 5.6.3` in the first ten
/// lines, then for a `test-plan version 1.2` token anywhere in the text. The
/// matched text is returned verbatim.
pub fn extract_jmeter_version(raw: &str) -> Option<String> {
    let banner = raw
        .trim_start_matches('\u{feff}')
        .trim()
        .split('\n')
        .take(BANNER_SCAN_LINES)
        .filter(|line| line.starts_with('#'))
        .find_map(|line| banner_regex().find(line));
    if let Some(m) = banner {
        return Some(m.as_str().to_string());
    }

    test_plan_regex()
        .find(raw)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_banner_in_comment() {
        let raw = "# Apache JMeter 5.6.3\ntimeStamp,elapsed\n1,2\n";
        assert_eq!(extract_jmeter_version(raw).as_deref(), Some("JMeter 5.6.3"));
    }

    #[test]
    fn banner_after_byte_order_mark() {
        let raw = "\u{feff}# Apache JMeter 5.6.3\ntimeStamp,elapsed\n1,2\n";
        assert_eq!(extract_jmeter_version(raw).as_deref(), Some("JMeter 5.6.3"));
    }

    #[test]
    fn banner_with_version_word_and_suffix() {
        let raw = "# generated by JMeter Version 5.4-SNAPSHOT\ntimeStamp\n1\n";
        assert_eq!(
            extract_jmeter_version(raw).as_deref(),
            Some("JMeter Version 5.4-SNAPSHOT")
        );
    }

    #[test]
    fn banner_outside_comment_is_ignored() {
        let raw = "timeStamp,label\n1,JMeter 5.6\n";
        assert_eq!(extract_jmeter_version(raw), None);
    }

    #[test]
    fn banner_after_tenth_line_is_ignored() {
        let mut raw = String::from("timeStamp,label\n");
        for i in 0..10 {
            raw.push_str(&format!("{i},x\n"));
        }
        raw.push_str("# JMeter 5.6\n");
        assert_eq!(extract_jmeter_version(&raw), None);
    }

    #[test]
    fn falls_back_to_test_plan_token() {
        let raw = "timeStamp,label\n1,test-plan version 2.1\n";
        assert_eq!(
            extract_jmeter_version(raw).as_deref(),
            Some("test-plan version 2.1")
        );
    }

    #[test]
    fn requires_dotted_version() {
        assert_eq!(extract_jmeter_version("# JMeter 5\n"), None);
    }

    #[test]
    fn none_when_absent() {
        assert_eq!(extract_jmeter_version("timeStamp,elapsed\n1,2\n"), None);
    }
}
