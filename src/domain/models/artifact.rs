use strum::EnumIter;

/// Structured payloads recognised inside model output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ArtifactKind {
    /// `@startuml` ... `@enduml`
    Uml,
    /// `<` ... `</svg>`
    Svg,
    /// `digraph` ... `}`
    Graph,
    /// `$@` ... `@$`
    RemoteCommand,
}

impl ArtifactKind {
    pub fn tokens(&self) -> (&'static str, &'static str) {
        match self {
            ArtifactKind::Uml => return ("@startuml", "@enduml"),
            ArtifactKind::Svg => return ("<", "</svg>"),
            ArtifactKind::Graph => return ("digraph", "}"),
            ArtifactKind::RemoteCommand => return ("$@", "@$"),
        }
    }

    pub fn is_diagram(&self) -> bool {
        return *self != ArtifactKind::RemoteCommand;
    }
}

/// An extracted span. `start` and `end` are byte offsets bounding the span in
/// the text originally scanned. Artifacts extracted in earlier passes are cut
/// out of `text`, so `text` only equals `source[start..end]` when no earlier
/// artifact sits inside that range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}
