use workstate::{convert_state, AgentAuth, ConvertError, Plan, State};

fn convert(plan_json: &str, graph: &str) -> Result<State, ConvertError> {
    let plan = Plan::parse(plan_json).expect("parse plan fixture");
    convert_state(&plan.modules(), graph)
}

#[test]
fn chained_resources_attach_the_agent_to_the_closer_one() {
    let state = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "coder_agent.main", "type": "coder_agent", "name": "main",
                         "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                    "connection_timeout": 120}},
                        {"address": "null_resource.a", "type": "null_resource", "name": "a",
                         "mode": "managed", "values": {}},
                        {"address": "null_resource.b", "type": "null_resource", "name": "b",
                         "mode": "managed", "values": {}}
                    ]
                }
            }
        }"#,
        r#"digraph {
	compound = "true"
	newrank = "true"
	subgraph "root" {
		"[root] coder_agent.main" [label = "coder_agent.main", shape = "box"]
		"[root] null_resource.a" [label = "null_resource.a", shape = "box"]
		"[root] null_resource.b" [label = "null_resource.b", shape = "box"]
		"[root] coder_agent.main" -> "[root] null_resource.b"
		"[root] null_resource.b" -> "[root] null_resource.a"
	}
}"#,
    )
    .expect("convert chained resources");

    assert_eq!(state.resources.len(), 2);
    let a = &state.resources[0];
    assert_eq!(a.name, "a");
    assert!(a.agents.is_empty());

    let b = &state.resources[1];
    assert_eq!(b.name, "b");
    assert_eq!(b.agents.len(), 1);
    let agent = &b.agents[0];
    assert_eq!(agent.name, "main");
    assert_eq!(agent.operating_system, "linux");
    assert_eq!(agent.architecture, "amd64");
    assert_eq!(agent.connection_timeout_seconds, 120);
    assert_eq!(agent.auth, AgentAuth::Token(String::new()));
    // no display_apps block means everything but insiders
    assert!(agent.display_apps.vscode);
    assert!(!agent.display_apps.vscode_insiders);
    assert!(agent.display_apps.web_terminal);
    assert!(agent.display_apps.ssh_helper);
    assert!(agent.display_apps.port_forwarding_helper);
}

#[test]
fn conflicting_resources_at_equal_depth_pick_the_first_listed() {
    let state = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.first", "type": "null_resource",
                         "name": "first", "mode": "managed", "values": {}},
                        {"address": "null_resource.second", "type": "null_resource",
                         "name": "second", "mode": "managed", "values": {}},
                        {"address": "coder_agent.main", "type": "coder_agent", "name": "main",
                         "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                    "connection_timeout": 120}}
                    ]
                }
            }
        }"#,
        r#"digraph {
	subgraph "root" {
		"[root] coder_agent.main" -> "[root] null_resource.first"
		"[root] coder_agent.main" -> "[root] null_resource.second"
	}
}"#,
    )
    .expect("convert conflicting resources");

    assert_eq!(state.resources.len(), 2);
    let first = &state.resources[0];
    assert_eq!(first.name, "first");
    assert_eq!(first.agents.len(), 1);
    assert_eq!(first.agents[0].name, "main");
    assert!(state.resources[1].agents.is_empty());
}

#[test]
fn multiple_agents_on_one_resource_sort_by_name() {
    let state = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
                         "mode": "managed", "values": {}},
                        {"address": "coder_agent.dev2", "type": "coder_agent", "name": "dev2",
                         "mode": "managed",
                         "values": {"os": "darwin", "arch": "amd64", "auth": "token",
                                    "connection_timeout": 1, "motd_file": "/etc/motd",
                                    "shutdown_script": "echo bye bye"}},
                        {"address": "coder_agent.dev1", "type": "coder_agent", "name": "dev1",
                         "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                    "connection_timeout": 120}},
                        {"address": "coder_agent.dev4", "type": "coder_agent", "name": "dev4",
                         "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                    "connection_timeout": 120}},
                        {"address": "coder_agent.dev3", "type": "coder_agent", "name": "dev3",
                         "mode": "managed",
                         "values": {"os": "windows", "arch": "arm64", "auth": "token",
                                    "connection_timeout": 120,
                                    "troubleshooting_url": "https://example.com/troubleshoot"}}
                    ]
                }
            }
        }"#,
        r#"digraph {
	subgraph "root" {
		"[root] coder_agent.dev1" -> "[root] null_resource.dev"
		"[root] coder_agent.dev2" -> "[root] null_resource.dev"
		"[root] coder_agent.dev3" -> "[root] null_resource.dev"
		"[root] coder_agent.dev4" -> "[root] null_resource.dev"
	}
}"#,
    )
    .expect("convert multiple agents");

    assert_eq!(state.resources.len(), 1);
    let dev = &state.resources[0];
    let names: Vec<&str> = dev.agents.iter().map(|agent| agent.name.as_str()).collect();
    assert_eq!(names, vec!["dev1", "dev2", "dev3", "dev4"]);

    let dev2 = &dev.agents[1];
    assert_eq!(dev2.operating_system, "darwin");
    assert_eq!(dev2.connection_timeout_seconds, 1);
    assert_eq!(dev2.motd_file, "/etc/motd");
    assert_eq!(dev2.shutdown_script, "echo bye bye");
    assert_eq!(dev2.scripts.len(), 1);
    let shutdown = &dev2.scripts[0];
    assert_eq!(shutdown.display_name, "Shutdown Script");
    assert_eq!(shutdown.icon, "/emojis/25c0.png");
    assert_eq!(shutdown.log_path, "coder-shutdown-script.log");
    assert_eq!(shutdown.script, "echo bye bye");
    assert!(shutdown.run_on_stop);
    assert!(!shutdown.run_on_start);

    let dev3 = &dev.agents[2];
    assert_eq!(dev3.architecture, "arm64");
    assert_eq!(dev3.troubleshooting_url, "https://example.com/troubleshoot");
}

#[test]
fn module_resources_resolve_through_full_addresses() {
    let state = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [],
                    "child_modules": [{
                        "resources": [
                            {"address": "module.example.null_resource.example",
                             "type": "null_resource", "name": "example", "mode": "managed",
                             "values": {}},
                            {"address": "module.example.coder_agent.main",
                             "type": "coder_agent", "name": "main", "mode": "managed",
                             "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                        "connection_timeout": 120}}
                        ]
                    }]
                }
            }
        }"#,
        r#"digraph {
	subgraph "root" {
		"[root] module.example.coder_agent.main (expand)" [label = "module.example.coder_agent.main", shape = "box"]
		"[root] module.example.null_resource.example (expand)" [label = "module.example.null_resource.example", shape = "box"]
		"[root] module.example.coder_agent.main (expand)" -> "[root] module.example.null_resource.example (expand)"
	}
}"#,
    )
    .expect("convert module resources");

    assert_eq!(state.resources.len(), 1);
    let example = &state.resources[0];
    assert_eq!(example.name, "example");
    assert_eq!(example.agents.len(), 1);
    assert_eq!(example.agents[0].name, "main");
}

#[test]
fn duplicate_addresses_across_plan_and_prior_state_emit_once() {
    let resources = r#"[
        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
         "mode": "managed", "values": {}},
        {"address": "coder_agent.main", "type": "coder_agent", "name": "main",
         "mode": "managed",
         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                    "connection_timeout": 120}}
    ]"#;
    let state = convert(
        &format!(
            r#"{{
                "planned_values": {{"root_module": {{"resources": {resources}}}}},
                "prior_state": {{"values": {{"root_module": {{"resources": {resources}}}}}}}
            }}"#
        ),
        r#"digraph {
	"[root] coder_agent.main" -> "[root] null_resource.dev"
}"#,
    )
    .expect("convert duplicated views");

    assert_eq!(state.resources.len(), 1);
    assert_eq!(state.resources[0].agents.len(), 1);
}

#[test]
fn data_mode_resources_never_reach_the_output() {
    let state = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
                         "mode": "managed", "values": {}},
                        {"address": "data.local_file.ignored", "type": "local_file",
                         "name": "ignored", "mode": "data", "values": {}}
                    ]
                }
            }
        }"#,
        "digraph {\n}",
    )
    .expect("convert with data source");

    let names: Vec<&str> = state.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["dev"]);
}

#[test]
fn explicit_display_apps_replace_the_defaults() {
    let state = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
                         "mode": "managed", "values": {}},
                        {"address": "coder_agent.main", "type": "coder_agent", "name": "main",
                         "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                    "connection_timeout": 120,
                                    "display_apps": [{"vscode_insiders": true,
                                                      "web_terminal": true}]}}
                    ]
                }
            }
        }"#,
        r#"digraph {
	"[root] coder_agent.main" -> "[root] null_resource.dev"
}"#,
    )
    .expect("convert display apps");

    let agent = &state.resources[0].agents[0];
    assert!(agent.display_apps.vscode_insiders);
    assert!(agent.display_apps.web_terminal);
    assert!(!agent.display_apps.vscode);
    assert!(!agent.display_apps.ssh_helper);
    assert!(!agent.display_apps.port_forwarding_helper);
}

#[test]
fn agent_without_a_reachable_resource_is_fatal() {
    let err = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
                         "mode": "managed", "values": {}},
                        {"address": "coder_agent.stranded", "type": "coder_agent",
                         "name": "stranded", "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64"}}
                    ]
                }
            }
        }"#,
        "digraph {\n}",
    )
    .expect_err("stranded agent must fail");
    assert!(err.to_string().contains("no reachable resource"));
}

#[test]
fn duplicate_agent_names_are_fatal() {
    let err = convert(
        r#"{
            "planned_values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
                         "mode": "managed", "values": {}},
                        {"address": "coder_agent.main", "type": "coder_agent", "name": "main",
                         "mode": "managed", "values": {"os": "linux", "arch": "amd64"}},
                        {"address": "module.m.coder_agent.main", "type": "coder_agent",
                         "name": "main", "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64"}}
                    ]
                }
            }
        }"#,
        r#"digraph {
	"[root] coder_agent.main" -> "[root] null_resource.dev"
	"[root] module.m.coder_agent.main" -> "[root] null_resource.dev"
}"#,
    )
    .expect_err("duplicate agent names must fail");
    assert!(err.to_string().contains("duplicate agent name"));
}

#[test]
fn applied_state_dumps_convert_like_plans() {
    let dump = workstate::StateDump::parse(
        r#"{
            "values": {
                "root_module": {
                    "resources": [
                        {"address": "null_resource.dev", "type": "null_resource", "name": "dev",
                         "mode": "managed", "values": {}},
                        {"address": "coder_agent.main", "type": "coder_agent", "name": "main",
                         "mode": "managed",
                         "values": {"os": "linux", "arch": "amd64", "auth": "token",
                                    "token": "generated-at-apply",
                                    "connection_timeout": 120}}
                    ]
                }
            }
        }"#,
    )
    .expect("parse state dump");

    let state = convert_state(
        &dump.modules(),
        r#"digraph {
	"[root] coder_agent.main" -> "[root] null_resource.dev"
}"#,
    )
    .expect("convert state dump");

    let agent = &state.resources[0].agents[0];
    assert_eq!(
        agent.auth,
        AgentAuth::Token("generated-at-apply".to_string())
    );
}

#[test]
fn malformed_graph_is_a_parse_error() {
    let err = convert(
        r#"{"planned_values": {"root_module": {"resources": []}}}"#,
        "this is not a graph",
    )
    .expect_err("malformed graph must fail");
    assert!(err.to_string().contains("failed to parse dependency graph"));
}
