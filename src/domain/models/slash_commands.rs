#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_model_list()
            || cmd.is_model_set()
            || cmd.is_branch_create()
            || cmd.is_branch_switch()
            || cmd.is_branch_list()
            || cmd.is_artifacts()
            || cmd.is_render()
            || cmd.is_run()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    /// First argument, if one was provided.
    pub fn arg(&self) -> Option<&str> {
        return self.args.first().map(|e| return e.as_str());
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_model_list(&self) -> bool {
        return ["/ml", "/modellist", "/modelist"].contains(&self.command.as_str());
    }

    pub fn is_model_set(&self) -> bool {
        return ["/m", "/model"].contains(&self.command.as_str());
    }

    pub fn is_branch_create(&self) -> bool {
        return ["/b", "/branch"].contains(&self.command.as_str());
    }

    pub fn is_branch_switch(&self) -> bool {
        return ["/s", "/switch"].contains(&self.command.as_str());
    }

    pub fn is_branch_list(&self) -> bool {
        return ["/bl", "/branches"].contains(&self.command.as_str());
    }

    pub fn is_artifacts(&self) -> bool {
        return ["/art", "/artifacts"].contains(&self.command.as_str());
    }

    pub fn is_render(&self) -> bool {
        return ["/r", "/render"].contains(&self.command.as_str());
    }

    pub fn is_run(&self) -> bool {
        return ["/run"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
