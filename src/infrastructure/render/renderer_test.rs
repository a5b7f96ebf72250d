use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::Renderer;
use crate::domain::models::Artifact;
use crate::domain::models::ArtifactKind;
use crate::domain::models::ProcessOutput;
use crate::domain::models::ProcessRunner;

#[derive(Default)]
struct FakeRunner {
    calls: Mutex<Vec<(String, Vec<String>, String)>>,
    code: i32,
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    #[allow(clippy::implicit_return)]
    async fn run(
        &self,
        stdin: &[u8],
        command: &str,
        args: &[String],
        _cwd: &Path,
    ) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push((
            command.to_string(),
            args.to_vec(),
            String::from_utf8_lossy(stdin).to_string(),
        ));

        return Ok(ProcessOutput {
            stdout: b"<svg/>".to_vec(),
            stderr: "syntax error on line 2".to_string(),
            code: self.code,
        });
    }
}

fn artifact(kind: ArtifactKind, text: &str) -> Artifact {
    return Artifact {
        kind,
        text: text.to_string(),
        start: 0,
        end: text.len(),
    };
}

fn work_dir(name: &str) -> std::path::PathBuf {
    return std::env::temp_dir().join(format!("muesli-render-{name}-{}", std::process::id()));
}

#[tokio::test]
async fn it_renders_uml_through_plantuml() -> Result<()> {
    let runner = Arc::new(FakeRunner::default());
    let renderer = Renderer::new(runner.clone(), work_dir("uml"));

    let svg = renderer
        .render(&artifact(ArtifactKind::Uml, "@startuml\nA -> B\n@enduml"))
        .await?;

    assert_eq!(svg, b"<svg/>".to_vec());
    assert_eq!(
        runner.calls.lock().unwrap().clone(),
        vec![(
            "plantuml".to_string(),
            vec!["-tsvg".to_string(), "-pipe".to_string()],
            "@startuml\nA -> B\n@enduml".to_string()
        )]
    );

    return Ok(());
}

#[tokio::test]
async fn it_renders_graphs_through_dot() -> Result<()> {
    let runner = Arc::new(FakeRunner::default());
    let renderer = Renderer::new(runner.clone(), work_dir("dot"));

    renderer
        .render(&artifact(ArtifactKind::Graph, "digraph g { a -> b }"))
        .await?;

    let calls = runner.calls.lock().unwrap().clone();
    assert_eq!(calls[0].0, "dot");
    assert_eq!(calls[0].1, vec!["-Tsvg".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_passes_svg_through() -> Result<()> {
    let runner = Arc::new(FakeRunner::default());
    let dir = work_dir("svg");
    let renderer = Renderer::new(runner.clone(), dir.clone());

    let path = renderer
        .render_to_file(&artifact(ArtifactKind::Svg, "<svg></svg>"), "artifact-1")
        .await?;

    assert_eq!(path, dir.join("artifact-1.svg"));
    assert_eq!(tokio::fs::read_to_string(&path).await?, "<svg></svg>");
    assert!(runner.calls.lock().unwrap().is_empty());

    tokio::fs::remove_dir_all(dir).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_on_tool_errors() {
    let runner = Arc::new(FakeRunner {
        code: 1,
        ..FakeRunner::default()
    });
    let renderer = Renderer::new(runner, work_dir("fail"));

    let res = renderer
        .render(&artifact(ArtifactKind::Graph, "digraph {"))
        .await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"dot failed with exit code 1: syntax error on line 2");
}

#[tokio::test]
async fn it_refuses_remote_commands() {
    let renderer = Renderer::new(Arc::new(FakeRunner::default()), work_dir("remote"));
    let res = renderer
        .render(&artifact(ArtifactKind::RemoteCommand, "$@ ls @$"))
        .await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"remote-command artifacts can't be rendered");
}

#[test]
fn it_maps_commands_to_kinds() {
    assert!(Renderer::command_for(ArtifactKind::Svg).is_none());
    assert!(Renderer::command_for(ArtifactKind::RemoteCommand).is_none());
    assert_eq!(Renderer::command_for(ArtifactKind::Graph).unwrap().0, "dot");
}
