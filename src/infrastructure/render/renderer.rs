#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;

use super::TokioProcessRunner;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Artifact;
use crate::domain::models::ArtifactKind;
use crate::domain::models::ProcessRunner;

/// Turns diagram artifacts into SVG using the usual command line tools.
pub struct Renderer {
    runner: Arc<dyn ProcessRunner>,
    work_dir: PathBuf,
}

impl Default for Renderer {
    fn default() -> Renderer {
        return Renderer::new(
            Arc::new(TokioProcessRunner::default()),
            PathBuf::from(Config::get(ConfigKey::RenderDir)),
        );
    }
}

impl Renderer {
    pub fn new(runner: Arc<dyn ProcessRunner>, work_dir: PathBuf) -> Renderer {
        return Renderer { runner, work_dir };
    }

    /// Program and arguments reading the diagram source from stdin and writing
    /// SVG to stdout. `None` for artifacts that need no conversion.
    pub fn command_for(kind: ArtifactKind) -> Option<(&'static str, Vec<String>)> {
        match kind {
            ArtifactKind::Uml => {
                return Some(("plantuml", vec!["-tsvg".to_string(), "-pipe".to_string()]));
            }
            ArtifactKind::Graph => return Some(("dot", vec!["-Tsvg".to_string()])),
            ArtifactKind::Svg | ArtifactKind::RemoteCommand => return None,
        }
    }

    async fn ensure_work_dir(&self) -> Result<()> {
        if !self.work_dir.exists() {
            fs::create_dir_all(&self.work_dir).await?;
        }

        return Ok(());
    }

    pub async fn render(&self, artifact: &Artifact) -> Result<Vec<u8>> {
        if !artifact.kind.is_diagram() {
            bail!(format!("{} artifacts can't be rendered", artifact.kind));
        }

        let (command, args) = match Renderer::command_for(artifact.kind) {
            Some(cmd) => cmd,
            None => return Ok(artifact.text.as_bytes().to_vec()),
        };

        self.ensure_work_dir().await?;
        let output = self
            .runner
            .run(artifact.text.as_bytes(), command, &args, &self.work_dir)
            .await?;

        if !output.success() {
            tracing::error!(command, code = output.code, stderr = %output.stderr, "Render failed");
            bail!(format!(
                "{command} failed with exit code {}: {}",
                output.code,
                output.stderr.trim()
            ));
        }

        return Ok(output.stdout);
    }

    /// Renders `artifact` to `<work_dir>/<name>.svg`.
    pub async fn render_to_file(&self, artifact: &Artifact, name: &str) -> Result<PathBuf> {
        let svg = self.render(artifact).await?;
        self.ensure_work_dir().await?;
        let path = self.work_dir.join(format!("{name}.svg"));
        fs::write(&path, svg).await?;

        return Ok(path);
    }
}
