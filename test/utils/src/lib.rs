/// A model answer carrying a sequence diagram and a dependency graph, in that
/// order of priority but with the graph written first.
pub fn diagram_fixture() -> &'static str {
    return r#"
Here's how the services depend on each other.

digraph deps {
    api -> db;
    api -> cache;
}

And the request flow as a sequence diagram.

@startuml
Alice -> Bob: Authentication Request
Bob --> Alice: Authentication Response
@enduml

That's it!
"#
    .trim();
}

/// A model answer asking for commands to be run on a remote host.
pub fn remote_command_fixture() -> &'static str {
    return r#"
Let's check the disk usage and the running containers first.

$@ df -h @$

$@ docker ps --format '{{.Names}}' @$

Send me the output once you have it.
"#
    .trim();
}

/// Newline delimited partial responses as streamed by `/api/generate`.
pub fn stream_fixture() -> String {
    return [
        r#"{"model":"llama2","created_at":"2023-11-15T10:00:00.000Z","response":"Hello","done":false}"#,
        r#"{"model":"llama2","created_at":"2023-11-15T10:00:00.100Z","response":" there","done":false}"#,
        "",
        r#"{"model":"llama2","created_at":"2023-11-15T10:00:00.200Z","response":", world","done":false}"#,
        r#"{"model":"llama2","created_at":"2023-11-15T10:00:00.300Z","response":"","done":true,"context":[1,2,3],"total_duration":5000000,"load_duration":1000,"prompt_eval_count":12,"prompt_eval_duration":2000,"eval_count":3,"eval_duration":3000}"#,
    ]
    .join("\n");
}
