#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::io::Write;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Artifact;
use crate::domain::models::ArtifactKind;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::ChunkControl;
use crate::domain::models::GenerateResponse;
use crate::domain::models::RemoteExecutor;
use crate::domain::models::SlashCommand;
use crate::domain::models::StreamOutcome;
use crate::domain::services::ArtifactScanner;
use crate::domain::services::Conversation;
use crate::domain::services::SessionRegistry;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::remote::Ssh;
use crate::infrastructure::render::Renderer;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /modellist (/ml) - Lists all available models from the backend.
- /model (/m) [MODEL_NAME] - Switches to the given model, continuing its own branch. Prints the current model without a name.
- /branch (/b) [NAME] - Copies the current branch into a new branch and continues on it.
- /switch (/s) [NAME] - Continues on an existing branch, adopting its model.
- /branches (/bl) - Lists all branches, marking the current one.
- /artifacts (/art) - Lists diagrams and remote commands found in the last answer.
- /render (/r) [DIAGRAM_NUMBER?] - Renders diagrams from the last answer to SVG files. Diagrams are numbered in /artifacts order, skipping remote commands.
- /run [COMMAND_NUMBER?] - Runs remote commands from the last answer on the configured remote host. Every `$@ ... @$` command is numbered in the order it appears.
- /quit /exit (/q) - Exit muesli.
- /help (/h) - Provides this help menu.

DIAGRAM_NUMBER and COMMAND_NUMBER can be set as follows:
- `1` - Selects the first one.
- `1,3,5` - Selects 1, 3, and 5.
- `2..5`- Selects an inclusive range between 2 and 5.
- None - Selects all of them.
        "#;

    return text.trim().to_string();
}

pub fn format_artifacts(artifacts: &[Artifact]) -> String {
    return artifacts
        .iter()
        .enumerate()
        .map(|(idx, artifact)| {
            let first_line = artifact.text.lines().next().unwrap_or_default();
            return format!(
                "({}) {} [{}..{}] {}",
                idx + 1,
                artifact.kind,
                artifact.start,
                artifact.end,
                first_line.trim()
            );
        })
        .collect::<Vec<String>>()
        .join("\n");
}

/// Zero based indexes picked by one based `1`, `1,3` or `2..5` arguments.
/// Every index is picked when there are no arguments.
fn select_indexes(args: &[String], len: usize) -> Result<Vec<usize>> {
    let args = args
        .iter()
        .map(|e| return e.trim().to_string())
        .filter(|e| return !e.is_empty())
        .collect::<Vec<String>>();

    if args.is_empty() {
        return Ok((0..len).collect());
    }

    let parse = |value: &str| -> Result<usize> {
        let number = value.trim().parse::<usize>()?;
        if number == 0 || number > len {
            bail!(format!("Number {number} is not valid"));
        }
        return Ok(number - 1);
    };

    let mut indexes = vec![];
    for arg in args.iter() {
        for entry in arg.split(',').filter(|e| return !e.trim().is_empty()) {
            if let Some((first, last)) = entry.split_once("..") {
                let first = parse(first)?;
                let last = parse(last)?;
                indexes.extend(first..=last);
            } else {
                indexes.push(parse(entry)?);
            }
        }
    }

    return Ok(indexes);
}

/// Diagram artifacts, numbered by `/render` in this order.
fn diagrams(artifacts: &[Artifact]) -> Vec<&Artifact> {
    return artifacts
        .iter()
        .filter(|artifact| return artifact.kind.is_diagram())
        .collect();
}

fn print_fragment(res: &GenerateResponse) -> ChunkControl {
    if res.done {
        return ChunkControl::Continue;
    }

    let mut stdout = std::io::stdout();
    if write!(stdout, "{}", res.response).is_err() || stdout.flush().is_err() {
        return ChunkControl::Stop;
    }

    return ChunkControl::Continue;
}

fn print_stats(res: &GenerateResponse) {
    if res.eval_count == 0 {
        return;
    }

    println!(
        "{}",
        Paint::new(format!(
            "({} tokens, {:.1} tokens/s)",
            res.eval_count,
            res.tokens_per_second()
        ))
        .dimmed()
    );
}

/// The configured backend, health checked, and the model to start with.
async fn connect() -> Result<(BackendBox, String)> {
    let backend_name = Config::get(ConfigKey::Backend);
    let backend = match BackendName::parse(backend_name.to_string()) {
        Some(name) => BackendManager::get(name)?,
        None => bail!(format!("Unknown backend {backend_name}")),
    };
    backend.health_check().await?;

    let mut model = Config::get(ConfigKey::Model);
    if model.is_empty() {
        model = backend
            .list_models()
            .await?
            .first()
            .map(|e| return e.to_string())
            .ok_or_else(|| return anyhow!("The backend has no models available"))?;
    }

    return Ok((backend, model));
}

pub async fn print_models() -> Result<()> {
    let (backend, _) = connect().await?;
    println!("{}", backend.list_models().await?.join("\n"));

    return Ok(());
}

/// Sends one prompt, streaming the answer to stdout.
pub async fn ask(prompt: &str, image_paths: &[String]) -> Result<()> {
    let (backend, model) = connect().await?;
    let conversation = Conversation::new(backend, Arc::new(SessionRegistry::default()), &model);

    let mut images = vec![];
    for path in image_paths.iter() {
        images.push(fs::read(path).await?);
    }

    let outcome = conversation
        .ask_streaming(prompt, &images, print_fragment)
        .await?;
    println!();

    if let StreamOutcome::Completed(res) = outcome {
        print_stats(&res);
    }

    return Ok(());
}

struct Chat {
    conversation: Conversation,
    renderer: Renderer,
    remote: Box<dyn RemoteExecutor>,
    artifacts: Vec<Artifact>,
    answer: String,
}

impl Chat {
    fn new(conversation: Conversation) -> Chat {
        return Chat {
            conversation,
            renderer: Renderer::default(),
            remote: Box::<Ssh>::default(),
            artifacts: vec![],
            answer: "".to_string(),
        };
    }

    fn branch_label(&self) -> String {
        return self
            .conversation
            .sessions()
            .current()
            .map(|session| return session.name)
            .unwrap_or_else(|| return self.conversation.model().to_string());
    }

    async fn submit(&mut self, prompt: &str) -> Result<()> {
        let outcome = self
            .conversation
            .ask_streaming(prompt, &[], print_fragment)
            .await?;
        println!();

        let res = match outcome {
            StreamOutcome::Completed(res) => res,
            StreamOutcome::Cancelled => {
                println!("{}", Paint::yellow("Answer cancelled, nothing was recorded."));
                return Ok(());
            }
        };

        print_stats(&res);
        self.artifacts = ArtifactScanner::scan(&res.response);
        self.answer = res.response;

        if !self.artifacts.is_empty() {
            println!(
                "{}",
                Paint::cyan(format!(
                    "Found {} artifact(s), see /artifacts",
                    self.artifacts.len()
                ))
            );
        }

        return Ok(());
    }

    async fn render(&self, args: &[String]) -> Result<()> {
        let diagrams = diagrams(&self.artifacts);

        if diagrams.is_empty() {
            println!("There are no diagrams in the last answer.");
            return Ok(());
        }

        let turn = self
            .conversation
            .sessions()
            .current()
            .map(|session| return session.interactions().len())
            .unwrap_or_default();

        for idx in select_indexes(args, diagrams.len())? {
            let name = format!("{}-{turn}-{}", self.branch_label(), idx + 1);
            let path = self.renderer.render_to_file(diagrams[idx], &name).await?;
            println!("Rendered {} to {}", diagrams[idx].kind, path.to_string_lossy());
        }

        return Ok(());
    }

    async fn run(&self, args: &[String]) -> Result<()> {
        let commands = ArtifactScanner::remote_commands(&self.answer);
        if commands.is_empty() {
            println!("There are no remote commands in the last answer.");
            return Ok(());
        }

        for idx in select_indexes(args, commands.len())? {
            let (start, end) = ArtifactKind::RemoteCommand.tokens();
            println!("{}", Paint::cyan(format!("{start} {} {end}", commands[idx])));
            let output = self.remote.exec(&commands[idx]).await?;
            println!("{}", output.trim_end());
        }

        return Ok(());
    }

    /// Returns false when the chat should end.
    async fn handle_command(&mut self, cmd: &SlashCommand) -> Result<bool> {
        if cmd.is_quit() {
            return Ok(false);
        }

        if cmd.is_help() {
            println!("{}", help_text());
        } else if cmd.is_model_list() {
            let models = self.conversation.backend().list_models().await?;
            println!("{}", models.join("\n"));
        } else if cmd.is_model_set() {
            match cmd.arg() {
                Some(model) => {
                    let session = self.conversation.set_model(model);
                    println!("Using model {} on branch {}", session.model, session.name);
                }
                None => println!("{}", self.conversation.model()),
            }
        } else if cmd.is_branch_create() {
            let name = cmd
                .arg()
                .ok_or_else(|| return anyhow!("/branch needs a name"))?;
            let session = self.conversation.branch(name)?;
            println!(
                "Branched {} with {} interaction(s)",
                session.name,
                session.interactions().len()
            );
        } else if cmd.is_branch_switch() {
            let name = cmd
                .arg()
                .ok_or_else(|| return anyhow!("/switch needs a branch name"))?;
            let session = self.conversation.switch(name)?;
            println!("Switched to {} using model {}", session.name, session.model);
        } else if cmd.is_branch_list() {
            let current = self.branch_label();
            let sessions = self.conversation.sessions();
            for name in sessions.branches() {
                let marker = if name == current { "*" } else { " " };
                let model = sessions
                    .session(&name)
                    .map(|session| return session.model)
                    .unwrap_or_default();
                println!("{marker} {name} ({model})");
            }
        } else if cmd.is_artifacts() {
            if self.artifacts.is_empty() {
                println!("There are no artifacts in the last answer.");
            } else {
                println!("{}", format_artifacts(&self.artifacts));
            }
        } else if cmd.is_render() {
            self.render(&cmd.args).await?;
        } else if cmd.is_run() {
            self.run(&cmd.args).await?;
        }

        return Ok(true);
    }
}

/// Interactive chat over stdin. Errors of a single turn or command are
/// printed and the chat carries on.
pub async fn start() -> Result<()> {
    let (backend, model) = connect().await?;
    let conversation = Conversation::new(backend, Arc::new(SessionRegistry::default()), &model);
    let mut chat = Chat::new(conversation);

    println!(
        "{}",
        Paint::new(format!("Chatting with {model}. Type /help for commands.")).bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", Paint::green(format!("{}>", chat.branch_label())));
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let res = match SlashCommand::parse(&line) {
            Some(cmd) => chat.handle_command(&cmd).await,
            None => chat.submit(line.trim()).await.map(|_| return true),
        };

        match res {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                tracing::error!(error = ?err, "Chat turn failed");
                eprintln!("{}", Paint::red(format!("Error: {err}")));
            }
        }
    }

    return Ok(());
}
