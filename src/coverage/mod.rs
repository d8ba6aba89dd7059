//! Coverage file discovery and parsing (`spec.md` §4.2 C6, §6).
//!
//! Scans the project root for one of a fixed set of coverage report files,
//! in a fixed search order, and parses the first one found. Missing files
//! are not an error — absence just means coverage stays unavailable.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::metrics::CoverageSource;

/// Per-file line hit/total pair, keyed by the path as it appears in the
/// report (native `cover.out` format reports block ranges rather than
/// individual lines, so this is derived rather than stored directly).
#[derive(Debug, Clone, Default)]
pub struct FileCoverage {
    pub lines_hit: u64,
    pub lines_found: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub source: CoverageSource,
    pub overall_pct: f64,
    pub files: HashMap<PathBuf, FileCoverage>,
}

/// Fixed file-name search order (`spec.md` §4.2, §6): native Go coverage
/// profile first, then LCOV, then Cobertura XML.
const SEARCH_ORDER: &[(&str, CoverageSource)] = &[
    ("cover.out", CoverageSource::GoCover),
    ("lcov.info", CoverageSource::Lcov),
    ("coverage.lcov", CoverageSource::Lcov),
    ("cobertura.xml", CoverageSource::Cobertura),
    ("coverage.xml", CoverageSource::Cobertura),
];

/// Finds and parses the first matching coverage file in `root`. Returns
/// `None` if no recognized file is present (not an error, per `spec.md`
/// §7 "missing optional data").
pub fn discover_and_parse(root: &Path) -> Option<CoverageReport> {
    for (name, source) in SEARCH_ORDER {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&path).ok()?;
        let report = match source {
            CoverageSource::GoCover => parse_go_cover(&content),
            CoverageSource::Lcov => parse_lcov(&content),
            CoverageSource::Cobertura => parse_cobertura(&content),
            CoverageSource::None => continue,
        };
        return Some(report);
    }
    None
}

// ---------------------------------------------------------------------
// Native format (`cover.out`): `mode:` header, then
// `file:startLine.startCol,endLine.endCol numStmts count` block records.
// ---------------------------------------------------------------------

struct GoCoverBlock {
    file: String,
    start_line: u32,
    end_line: u32,
    num_stmts: u64,
    count: u64,
}

fn parse_go_cover_line(line: &str) -> Option<GoCoverBlock> {
    let (file_and_range, counts) = line.rsplit_once(' ')?;
    let (file_and_range, num_stmts_str) = file_and_range.rsplit_once(' ')?;
    let (file, range) = file_and_range.rsplit_once(':')?;
    let (start, end) = range.split_once(',')?;
    let start_line: u32 = start.split('.').next()?.parse().ok()?;
    let end_line: u32 = end.split('.').next()?.parse().ok()?;
    Some(GoCoverBlock {
        file: file.to_string(),
        start_line,
        end_line,
        num_stmts: num_stmts_str.parse().ok()?,
        count: counts.parse().ok()?,
    })
}

fn parse_go_cover(content: &str) -> CoverageReport {
    let mut files: HashMap<PathBuf, FileCoverage> = HashMap::new();

    for line in content.lines() {
        if line.starts_with("mode:") || line.trim().is_empty() {
            continue;
        }
        let Some(block) = parse_go_cover_line(line) else { continue };
        let lines_in_block = (block.end_line.saturating_sub(block.start_line) + 1) as u64;
        let entry = files.entry(PathBuf::from(block.file)).or_default();
        entry.lines_found += block.num_stmts.max(lines_in_block);
        if block.count > 0 {
            entry.lines_hit += block.num_stmts.max(lines_in_block);
        }
    }

    finish(CoverageSource::GoCover, files)
}

// ---------------------------------------------------------------------
// LCOV: line-based, `SF:` starts a file section, `DA:line,count` data
// lines, `end_of_record` terminates a section.
// ---------------------------------------------------------------------

fn parse_lcov(content: &str) -> CoverageReport {
    let mut files: HashMap<PathBuf, FileCoverage> = HashMap::new();
    let mut current: Option<PathBuf> = None;
    let mut seen_lines: BTreeMap<usize, bool> = BTreeMap::new();

    for line in content.lines() {
        if let Some(path) = line.strip_prefix("SF:") {
            current = Some(PathBuf::from(path.trim()));
            seen_lines.clear();
        } else if let Some(da) = line.strip_prefix("DA:") {
            let Some((line_no, hits)) = da.split_once(',') else { continue };
            let (Ok(line_no), Ok(hits)) = (line_no.trim().parse::<usize>(), hits.trim().parse::<i64>()) else {
                continue;
            };
            seen_lines.insert(line_no, hits > 0);
        } else if line.trim() == "end_of_record" {
            if let Some(path) = current.take() {
                let lines_found = seen_lines.len() as u64;
                let lines_hit = seen_lines.values().filter(|h| **h).count() as u64;
                let entry = files.entry(path).or_default();
                entry.lines_found += lines_found;
                entry.lines_hit += lines_hit;
            }
        }
    }

    finish(CoverageSource::Lcov, files)
}

// ---------------------------------------------------------------------
// Cobertura: XML element `<coverage line-rate="…">`; per-class
// `<line number="n" hits="h"/>` elements are folded per-file for evidence
// even though the overall percentage uses the root `line-rate` attribute
// directly, per `spec.md` §6.
// ---------------------------------------------------------------------

fn parse_cobertura(content: &str) -> CoverageReport {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut line_rate: f64 = 0.0;
    let mut current_file: Option<PathBuf> = None;
    let mut files: HashMap<PathBuf, FileCoverage> = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => match tag.name().as_ref() {
                b"coverage" => {
                    if let Some(rate) = attribute(&tag, "line-rate") {
                        line_rate = rate.parse().unwrap_or(0.0);
                    }
                }
                b"class" => {
                    if let Some(name) = attribute(&tag, "filename") {
                        current_file = Some(PathBuf::from(name));
                    }
                }
                b"line" => {
                    if let Some(file) = &current_file {
                        let hits: u64 = attribute(&tag, "hits").and_then(|h| h.parse().ok()).unwrap_or(0);
                        let entry = files.entry(file.clone()).or_default();
                        entry.lines_found += 1;
                        if hits > 0 {
                            entry.lines_hit += 1;
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(tag)) if tag.name().as_ref() == b"class" => current_file = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let mut report = finish(CoverageSource::Cobertura, files);
    report.overall_pct = line_rate * 100.0;
    report
}

fn attribute(tag: &quick_xml::events::BytesStart, name: &str) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn finish(source: CoverageSource, files: HashMap<PathBuf, FileCoverage>) -> CoverageReport {
    let lines_found: u64 = files.values().map(|f| f.lines_found).sum();
    let lines_hit: u64 = files.values().map(|f| f.lines_hit).sum();
    let overall_pct = if lines_found == 0 {
        0.0
    } else {
        lines_hit as f64 / lines_found as f64 * 100.0
    };
    CoverageReport {
        source,
        overall_pct,
        files,
    }
}

/// Merges a parsed coverage report into an already-computed `C6Metrics`
/// (the testing analyzer only sees parsed source, not a coverage file
/// path, so this is applied as a separate pipeline step).
pub fn merge_into(metrics: &mut crate::metrics::C6Metrics, report: &CoverageReport) {
    metrics.coverage_pct = Some(report.overall_pct);
    metrics.coverage_source = Some(report.source);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_go_cover_block() {
        let content = "mode: set\nfoo/bar.go:3.14,5.2 2 1\nfoo/bar.go:7.1,9.2 1 0\n";
        let report = parse_go_cover(content);
        let cov = report.files.get(&PathBuf::from("foo/bar.go")).unwrap();
        assert_eq!(cov.lines_found, 3);
        assert_eq!(cov.lines_hit, 2);
    }

    #[test]
    fn parses_lcov_percent_as_hit_over_found() {
        let content = "SF:a.rs\nDA:1,1\nDA:2,0\nDA:3,5\nend_of_record\n";
        let report = parse_lcov(content);
        assert_eq!(report.source, CoverageSource::Lcov);
        assert!((report.overall_pct - (2.0 / 3.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn parses_cobertura_line_rate_directly() {
        let xml = r#"<?xml version="1.0"?>
<coverage line-rate="0.85">
  <packages>
    <package>
      <classes>
        <class filename="a.py">
          <lines>
            <line number="1" hits="1"/>
            <line number="2" hits="0"/>
          </lines>
        </class>
      </classes>
    </package>
  </packages>
</coverage>"#;
        let report = parse_cobertura(xml);
        assert!((report.overall_pct - 85.0).abs() < 1e-9);
    }

    #[test]
    fn missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_and_parse(dir.path()).is_none());
    }

    #[test]
    fn search_order_prefers_go_cover_over_lcov() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.out"), "mode: set\na.go:1.1,2.1 1 1\n").unwrap();
        std::fs::write(dir.path().join("lcov.info"), "SF:a.rs\nDA:1,0\nend_of_record\n").unwrap();
        let report = discover_and_parse(dir.path()).unwrap();
        assert_eq!(report.source, CoverageSource::GoCover);
    }
}
