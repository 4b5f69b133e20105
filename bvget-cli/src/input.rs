use std::fs;
use std::io;
use std::path::Path;

/// Read the URL list: one URL per line, blank lines and `#` comments skipped.
pub fn read_url_list(path: &Path) -> io::Result<Vec<String>> {
    Ok(parse_lines(&fs::read_to_string(path)?))
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let content = "\
# favourites
https://www.bilibili.com/video/BV1GJ411x7h7

  https://www.bilibili.com/video/BV1xx411c7mD
#https://www.bilibili.com/video/BV1commented
";
        assert_eq!(
            parse_lines(content),
            vec![
                "https://www.bilibili.com/video/BV1GJ411x7h7",
                "https://www.bilibili.com/video/BV1xx411c7mD",
            ]
        );
    }

    #[test]
    fn test_parse_lines_empty() {
        assert!(parse_lines("").is_empty());
        assert!(parse_lines("\n# only a comment\n\n").is_empty());
    }
}
