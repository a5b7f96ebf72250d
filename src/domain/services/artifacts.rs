#[cfg(test)]
#[path = "artifacts_test.rs"]
mod tests;

use std::cmp;
use std::ops::Range;

use crate::domain::models::Artifact;
use crate::domain::models::ArtifactKind;

/// Diagram grammars in the order they're tried.
const DIAGRAM_PRIORITY: [ArtifactKind; 3] =
    [ArtifactKind::Uml, ArtifactKind::Svg, ArtifactKind::Graph];

#[derive(Clone, Debug)]
struct Segment {
    pos: usize,
    origin: usize,
    len: usize,
}

/// Text left to scan, along with where each of its pieces sat in the
/// original input.
struct Remainder {
    text: String,
    segments: Vec<Segment>,
}

impl Remainder {
    fn new(text: &str) -> Remainder {
        return Remainder {
            text: text.to_string(),
            segments: vec![Segment {
                pos: 0,
                origin: 0,
                len: text.len(),
            }],
        };
    }

    /// Concatenates the given ranges of the current text into a new remainder.
    fn keep(&self, ranges: &[Range<usize>]) -> Remainder {
        let mut text = String::new();
        let mut segments = vec![];

        for range in ranges.iter().filter(|range| return !range.is_empty()) {
            let base = text.len();
            for seg in self.segments.iter() {
                let lo = cmp::max(seg.pos, range.start);
                let hi = cmp::min(seg.pos + seg.len, range.end);
                if lo < hi {
                    segments.push(Segment {
                        pos: base + (lo - range.start),
                        origin: seg.origin + (lo - seg.pos),
                        len: hi - lo,
                    });
                }
            }
            text.push_str(&self.text[range.clone()]);
        }

        return Remainder { text, segments };
    }

    /// Drops `span` and trims whatever is left.
    fn without(&self, span: &Range<usize>) -> Remainder {
        let cut = self.keep(&[0..span.start, span.end..self.text.len()]);
        let start = cut.text.len() - cut.text.trim_start().len();
        let end = cut.text.trim_end().len();
        if start >= end {
            return cut.keep(&[]);
        }

        return cut.keep(&[start..end]);
    }

    fn origin(&self, idx: usize) -> usize {
        return self
            .segments
            .iter()
            .find(|seg| return seg.pos <= idx && idx < seg.pos + seg.len)
            .map(|seg| return seg.origin + (idx - seg.pos))
            .unwrap_or(idx);
    }

    fn artifact(&self, kind: ArtifactKind, span: Range<usize>) -> Artifact {
        let start = self.origin(span.start);
        let end = if span.end > span.start {
            self.origin(span.end - 1) + 1
        } else {
            start
        };

        return Artifact {
            kind,
            text: self.text[span].to_string(),
            start,
            end,
        };
    }
}

/// Span from the first start token to the end of the last end token, when the
/// last end token doesn't begin before the start token. The two tokens may
/// overlap, as `<` and `</svg>` do.
fn greedy_span(text: &str, kind: ArtifactKind) -> Option<Range<usize>> {
    let (start_token, end_token) = kind.tokens();
    let start = text.find(start_token)?;
    let end = text.rfind(end_token)?;
    if end < start {
        return None;
    }

    return Some(start..end + end_token.len());
}

fn find_diagram(text: &str) -> Option<(ArtifactKind, Range<usize>)> {
    return DIAGRAM_PRIORITY.iter().find_map(|kind| {
        return greedy_span(text, *kind).map(|span| return (*kind, span));
    });
}

/// Finds diagrams and remote command blocks in model output.
pub struct ArtifactScanner {}

impl ArtifactScanner {
    /// Extracts artifacts from `text`.
    ///
    /// Each pass extracts the highest priority diagram found (UML, then SVG,
    /// then graph), spanning from its first start token to its last end token,
    /// and continues on the trimmed text that's left. When a pass finds no
    /// diagram, a `$@ ... @$` pair anywhere in the text left yields a single
    /// remote command artifact covering all of it.
    pub fn scan(text: &str) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = vec![];
        let mut remaining = Remainder::new(text);

        while !remaining.text.is_empty() {
            if let Some((kind, span)) = find_diagram(&remaining.text) {
                tracing::debug!(%kind, start = span.start, end = span.end, "Found artifact");
                artifacts.push(remaining.artifact(kind, span.clone()));
                remaining = remaining.without(&span);
                continue;
            }

            if greedy_span(&remaining.text, ArtifactKind::RemoteCommand).is_some() {
                let span = 0..remaining.text.len();
                artifacts.push(remaining.artifact(ArtifactKind::RemoteCommand, span));
            }

            break;
        }

        return artifacts;
    }

    /// Splits a remote command artifact into the individual commands found
    /// between each `$@` and the next `@$`.
    pub fn remote_commands(text: &str) -> Vec<String> {
        let (start_token, end_token) = ArtifactKind::RemoteCommand.tokens();
        let mut commands: Vec<String> = vec![];
        let mut rest = text;

        while let Some(start) = rest.find(start_token) {
            let body = &rest[start + start_token.len()..];
            let end = match body.find(end_token) {
                Some(end) => end,
                None => break,
            };

            let command = body[..end].trim();
            if !command.is_empty() {
                commands.push(command.to_string());
            }
            rest = &body[end + end_token.len()..];
        }

        return commands;
    }
}
