//! Pure helpers for generating alternative names and paths.
//!
//! Paths are handled as strings because targets may use either separator
//! style regardless of the host platform.

/// Edit distance between two strings (case-sensitive, by char)
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Largest edit distance still treated as a misspelling of `name`
pub fn spelling_tolerance(name: &str) -> usize {
    (name.chars().count() / 3).max(2)
}

/// Known names ordered by closeness to `requested`, within tolerance
pub fn closest_names<'a>(requested: &str, known: &'a [String]) -> Vec<&'a str> {
    let wanted = requested.trim().to_lowercase();
    let tolerance = spelling_tolerance(&wanted);
    let mut scored: Vec<(usize, &str)> = known
        .iter()
        .map(|k| (levenshtein(&wanted, &k.to_lowercase()), k.as_str()))
        .filter(|(d, _)| *d <= tolerance)
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, k)| k).collect()
}

/// Cheap rewrites of an application name
pub fn name_variants(name: &str) -> Vec<String> {
    let trimmed = name.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let base = trimmed
        .strip_suffix(".exe")
        .or_else(|| trimmed.strip_suffix(".EXE"))
        .unwrap_or(trimmed);
    let base = base.rsplit(['/', '\\']).next().unwrap_or(base);

    let mut out = Vec::new();
    for candidate in [
        base.to_string(),
        base.to_lowercase(),
        base.replace(' ', ""),
        base.replace(' ', "-").to_lowercase(),
        format!("{}.exe", base.to_lowercase()),
    ] {
        push_unique(&mut out, candidate);
    }
    out.retain(|c| !c.is_empty() && c != name);
    out
}

/// Separator used by a path string
pub fn separator_of(path: &str) -> char {
    if path.contains('\\') && !path.contains('/') { '\\' } else { '/' }
}

/// Last component of a path, if it has one
pub fn file_name(path: &str) -> Option<&str> {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
}

/// Parent of a path; `None` at a root or for a bare name
pub fn parent(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    let idx = trimmed.rfind(['/', '\\'])?;
    let head = &trimmed[..idx];
    if head.is_empty() {
        // "/name" -> "/"
        return Some(trimmed[..=idx].to_string());
    }
    if head.len() == 2 && head.ends_with(':') {
        // "C:\name" -> "C:\"
        return Some(trimmed[..=idx].to_string());
    }
    Some(head.to_string())
}

/// Join a directory and a name using the directory's separator
pub fn join(dir: &str, name: &str) -> String {
    let sep = separator_of(dir);
    if dir.ends_with(['/', '\\']) {
        format!("{}{}", dir, name)
    } else {
        format!("{}{}{}", dir, sep, name)
    }
}

/// Normalizations of a path that may be malformed, most conservative first
pub fn path_variants(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let cleaned = collapse_separators(&fix_colons(&strip_reserved(trimmed)));

    let mut out = Vec::new();
    for candidate in [
        cleaned.clone(),
        upper_drive(&cleaned),
        cleaned.replace('/', "\\"),
        cleaned.replace('\\', "/"),
        upper_drive(&cleaned.replace('/', "\\")),
        trimmed.to_string(),
        cleaned.to_lowercase(),
    ] {
        push_unique(&mut out, candidate);
    }
    out.retain(|c| !c.is_empty() && c != raw);
    out
}

fn strip_reserved(path: &str) -> String {
    path.chars()
        .filter(|c| !matches!(c, '<' | '>' | '|' | '"' | '?' | '*' | '\0'))
        .collect()
}

/// Keep a colon only where it can be a drive separator
fn fix_colons(path: &str) -> String {
    let starts_with_letter = path.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let mut out = String::with_capacity(path.len());
    for (idx, c) in path.char_indices() {
        if c == ':' {
            if idx == 1 && starts_with_letter {
                out.push(c);
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Collapse runs of separators, keeping a leading UNC `\\`
fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let unc = path.starts_with("\\\\");
    let mut last_sep = false;
    for c in path.chars() {
        let is_sep = c == '/' || c == '\\';
        if is_sep && last_sep && !(unc && out.len() == 1) {
            continue;
        }
        out.push(c);
        last_sep = is_sep;
    }
    out
}

fn upper_drive(path: &str) -> String {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(d), Some(':')) if d.is_ascii_lowercase() => {
            format!("{}{}", d.to_ascii_uppercase(), &path[1..])
        }
        _ => path.to_string(),
    }
}

fn push_unique(out: &mut Vec<String>, candidate: String) {
    if !out.contains(&candidate) {
        out.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("calcultor", "calculator"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("notepad", "notepad"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_closest_names() {
        let known = vec![
            "notepad".to_string(),
            "calculator".to_string(),
            "calendar".to_string(),
        ];
        let close = closest_names("calcultor", &known);
        assert_eq!(close.first(), Some(&"calculator"));
        assert!(!close.contains(&"notepad"));
    }

    #[test]
    fn test_closest_names_is_case_insensitive() {
        let known = vec!["Spotify".to_string()];
        assert_eq!(closest_names("spotfy", &known), vec!["Spotify"]);
    }

    #[test]
    fn test_name_variants() {
        let variants = name_variants("\"Visual Studio Code.exe\"");
        assert!(variants.contains(&"Visual Studio Code".to_string()));
        assert!(variants.contains(&"visual-studio-code".to_string()));
        assert!(variants.contains(&"VisualStudioCode".to_string()));
    }

    #[test]
    fn test_name_variants_exclude_original() {
        let variants = name_variants("notepad");
        assert!(!variants.contains(&"notepad".to_string()));
        assert!(variants.contains(&"notepad.exe".to_string()));
    }

    #[test]
    fn test_file_name_and_parent() {
        assert_eq!(file_name("/home/me/test.txt"), Some("test.txt"));
        assert_eq!(file_name("C:\\Users\\me\\"), Some("me"));
        assert_eq!(parent("/home/me/test.txt").as_deref(), Some("/home/me"));
        assert_eq!(parent("/test.txt").as_deref(), Some("/"));
        assert_eq!(parent("C:\\test.txt").as_deref(), Some("C:\\"));
        assert_eq!(parent("test.txt"), None);
    }

    #[test]
    fn test_join_uses_directory_separator() {
        assert_eq!(join("/home/me", "a.txt"), "/home/me/a.txt");
        assert_eq!(join("C:\\Users", "a.txt"), "C:\\Users\\a.txt");
        assert_eq!(join("/", "a.txt"), "/a.txt");
    }

    #[test]
    fn test_path_variants_fix_drive_and_separators() {
        let variants = path_variants("c::\\\\Users//me\\notes.txt");
        assert_eq!(variants[0], "c:\\Users/me\\notes.txt");
        assert!(variants.contains(&"C:\\Users/me\\notes.txt".to_string()));
        assert!(variants.contains(&"C:\\Users\\me\\notes.txt".to_string()));
        assert!(variants.contains(&"c:/Users/me/notes.txt".to_string()));
    }

    #[test]
    fn test_path_variants_strip_reserved_and_quotes() {
        let variants = path_variants("\"/home/me/no*tes?.txt\"");
        assert_eq!(variants[0], "/home/me/notes.txt");
    }

    #[test]
    fn test_path_variants_are_unique_and_new() {
        let raw = "/home/me/notes.txt";
        let variants = path_variants(raw);
        assert!(!variants.contains(&raw.to_string()));
        let mut sorted = variants.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), variants.len());
    }
}
