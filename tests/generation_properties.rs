//! Behaviour every target must share: complete, deterministic, well-formed
//! output, with one failing target never affecting the others.

use cli_forge::errors::{AppError, AppResult};
use cli_forge::generator::{Generator, GeneratorSettings};
use cli_forge::hooks::{HookBinding, HookResolver, NamingConvention};
use cli_forge::ir::{CommandNode, Ir, TreeBuilder};
use cli_forge::render::{
    validate_path, Artifact, ArtifactKind, EmitContext, Fragment, RenderOptions, Renderer,
    RendererRegistry,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

const TARGETS: [&str; 4] = ["python", "nodejs", "typescript", "rust"];

fn build(doc: Value) -> Ir {
    TreeBuilder::new().build(&doc).unwrap()
}

fn sample_tree() -> Ir {
    build(json!({"cli": {
        "name": "ops",
        "version": "0.3.0",
        "options": [{"name": "verbose", "short": "v", "type": "flag", "desc": "Chatty"}],
        "commands": {
            "hello": {
                "desc": "Say hello",
                "alias": "hi",
                "args": [{"name": "name", "desc": "Who"}],
                "options": [{"name": "style", "choices": ["casual", "formal", "enthusiastic"], "default": "casual"}]
            },
            "db": {"desc": "Database", "subcommands": {
                "migrate": {"desc": "Migrate", "options": [{"name": "steps", "type": "integer", "default": 1}]},
                "backup": {"desc": "Backup", "args": [{"name": "target", "required": false}]}
            }},
            "server": {"desc": "Run the server", "lifecycle": "managed",
                       "options": [{"name": "port", "type": "integer", "default": 8080}]}
        }
    }}))
}

fn render(target_id: &str, ir: &Ir) -> Vec<Artifact> {
    RendererRegistry::with_builtin()
        .get(target_id)
        .unwrap()
        .render(ir, &RenderOptions::default())
        .unwrap()
}

fn find<'a>(artifacts: &'a [Artifact], kind: ArtifactKind) -> &'a Artifact {
    artifacts.iter().find(|a| a.kind() == kind).unwrap()
}

fn hooks_of(artifacts: &[Artifact]) -> &str {
    &find(artifacts, ArtifactKind::HookStub).content
}

fn entry_of(artifacts: &[Artifact]) -> &str {
    &find(artifacts, ArtifactKind::EntryPoint).content
}

#[test]
fn test_rendering_is_deterministic() {
    let ir = sample_tree();
    for target_id in TARGETS {
        assert_eq!(render(target_id, &ir), render(target_id, &ir), "{target_id}");
    }
}

#[test]
fn test_artifact_paths_are_clean_and_unique() {
    let ir = sample_tree();
    for target_id in TARGETS {
        let artifacts = render(target_id, &ir);
        let mut seen = HashSet::new();
        for artifact in &artifacts {
            assert!(validate_path(&artifact.path).is_ok(), "{target_id}: {}", artifact.path);
            assert!(seen.insert(artifact.path.clone()), "{target_id}: {}", artifact.path);
            assert_eq!(artifact.target(), Some(target_id));
            if artifact.executable {
                assert!(artifact.kind().may_be_executable(), "{target_id}: {}", artifact.path);
            }
        }
        assert!(artifacts.iter().any(|a| a.kind() == ArtifactKind::Bootstrap));
        assert_eq!(
            artifacts.iter().filter(|a| a.kind() == ArtifactKind::HookStub).count(),
            1,
            "{target_id}"
        );
    }
}

#[test]
fn test_every_command_reaches_every_target() {
    let ir = sample_tree();
    for target_id in TARGETS {
        let artifacts = render(target_id, &ir);
        let entry = entry_of(&artifacts);
        for node in ir.walk() {
            assert!(
                entry.contains(&format!("\"{}\"", node.name)),
                "{target_id} is missing {}",
                node.name
            );
        }
    }
}

/// How each target spells a candidate list literal in its entry point
fn candidate_literal(target_id: &str, names: &[String]) -> String {
    match target_id {
        "nodejs" | "typescript" => serde_json::to_string(names).unwrap(),
        _ => {
            let quoted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
            let list = format!("[{}]", quoted.join(", "));
            if target_id == "rust" {
                format!("&{list}")
            } else {
                list
            }
        }
    }
}

fn resolver_for(target_id: &str) -> HookResolver {
    let naming = RendererRegistry::with_builtin().get(target_id).unwrap().naming();
    HookResolver::new(naming, RenderOptions::default().hook_threshold)
}

#[test]
fn test_deep_commands_list_candidates_in_order() {
    let ir = build(json!({"name": "deep", "commands": {"a": {"desc": "a", "subcommands": {
        "b": {"desc": "b", "subcommands": {"c": {"desc": "c", "subcommands": {
            "d": {"desc": "d", "subcommands": {"e": {"desc": "e"}}}
        }}}}
    }}}}));
    let deep: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();

    let expected = [
        ("python", ["on_a_b_c_d_e", "on_a_e", "on_d_e", "on_command_executed"]),
        ("nodejs", ["onABCDE", "onAE", "onDE", "onCommandExecuted"]),
        ("typescript", ["onABCDE", "onAE", "onDE", "onCommandExecuted"]),
        ("rust", ["on_a_b_c_d_e", "on_a_e", "on_d_e", "on_command_executed"]),
    ];
    for (target_id, names) in expected {
        let resolver = resolver_for(target_id);
        let candidates = resolver.resolve(&deep);
        assert_eq!(candidates, names, "{target_id}");
        assert_eq!(candidates.first(), Some(&resolver.naming().callable(&deep)));
        assert_eq!(candidates.last().map(String::as_str), Some(resolver.naming().generic()));
        let unique: HashSet<&String> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len(), "{target_id}");

        let artifacts = render(target_id, &ir);
        let literal = candidate_literal(target_id, &candidates);
        assert!(
            entry_of(&artifacts).contains(&literal),
            "{target_id} entry point is missing {literal}"
        );
    }
}

#[test]
fn test_hello_scenario() {
    let ir = build(json!({"name": "greeter", "commands": {"hello": {
        "desc": "Say hello",
        "args": [{"name": "name"}],
        "options": [{"name": "style", "choices": ["casual", "formal", "enthusiastic"], "default": "casual"}]
    }}}));
    let hello = vec!["hello".to_string()];

    let expected = [
        ("python", "@click.argument(\"name\"", "default=\"casual\"", "def on_hello("),
        ("nodejs", "new Argument(\"<name>\"", ".default(\"casual\")", "function onHello("),
        ("typescript", "new Argument(\"<name>\"", ".default(\"casual\")", "function onHello("),
        ("rust", "Arg::new(\"name\")", ".default_value(\"casual\")", "pub fn on_hello("),
    ];
    for (target_id, argument, default, stub) in expected {
        let artifacts = render(target_id, &ir);
        let entry = entry_of(&artifacts);
        assert!(entry.contains(argument), "{target_id}: {argument}");
        assert!(entry.contains(default), "{target_id}: {default}");

        let candidates = resolver_for(target_id).resolve(&hello);
        assert_eq!(candidates.len(), 2, "{target_id}");
        assert!(entry.contains(&candidate_literal(target_id, &candidates)), "{target_id}");
        assert!(hooks_of(&artifacts).contains(stub), "{target_id}: {stub}");
    }

    assert!(hooks_of(&render("python", &ir)).contains("def on_hello(name, style):"));
    assert!(hooks_of(&render("nodejs", &ir)).contains("async function onHello({ name, style })"));
}

#[test]
fn test_joined_hook_names_fail_every_target() {
    let ir = build(json!({"name": "joined", "commands": {
        "a-b": {"desc": "top"},
        "a": {"desc": "a", "subcommands": {"b": {"desc": "nested"}}}
    }}));
    let registry = RendererRegistry::with_builtin();

    for target_id in TARGETS {
        let err = registry
            .get(target_id)
            .unwrap()
            .render(&ir, &RenderOptions::default())
            .unwrap_err();
        match err {
            AppError::HookNameCollision { name, first, path } => {
                assert_eq!(name, resolver_for(target_id).naming().callable(&path));
                assert_eq!(first, vec!["a-b".to_string()]);
                assert_eq!(path, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("{target_id}: expected a hook name collision, got {other:?}"),
        }
    }
}

#[test]
fn test_managed_server_scenario() {
    let ir = build(json!({"name": "svc", "commands": {
        "server": {"desc": "Run the server", "lifecycle": "managed"}
    }}));

    for target_id in TARGETS {
        let artifacts = render(target_id, &ir);
        let entry = entry_of(&artifacts);
        for action in ["start", "stop", "restart", "status"] {
            assert!(entry.contains(&format!("\"{action}\"")), "{target_id}: {action}");
        }
        assert!(hooks_of(&artifacts).contains("ServerController"), "{target_id}");
    }
}

/// Fails on every node so the generator sees one broken target
struct Broken;

impl Renderer for Broken {
    fn target_id(&self) -> &'static str {
        "broken"
    }
    fn display_name(&self) -> &'static str {
        "Broken"
    }
    fn naming(&self) -> NamingConvention {
        NamingConvention::SNAKE
    }
    fn templates(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }
    fn transform_context(&self, _ir: &Ir) -> Value {
        json!({})
    }
    fn output_layout(&self, _ir: &Ir) -> IndexMap<String, String> {
        IndexMap::new()
    }
    fn emit_command(
        &self,
        _ctx: &EmitContext<'_>,
        _node: &CommandNode,
        _binding: &HookBinding,
        _children: Vec<Fragment>,
    ) -> AppResult<Fragment> {
        Err(AppError::template("unsupported construct"))
    }
    fn compose(&self, _ctx: &EmitContext<'_>, _fragments: &[Fragment]) -> AppResult<Vec<Artifact>> {
        Ok(Vec::new())
    }
}

fn broken() -> Box<dyn Renderer> {
    Box::new(Broken)
}

#[tokio::test]
async fn test_failing_target_is_isolated() {
    let mut registry = RendererRegistry::with_builtin();
    registry.register("broken", broken);
    let generator = Generator::new(Arc::new(registry), GeneratorSettings::default());
    let ir = Arc::new(sample_tree());

    let targets: Vec<String> = ["python", "broken", "rust"].iter().map(|s| s.to_string()).collect();
    let outcomes = generator.generate(Arc::clone(&ir), &targets).await;

    assert!(outcomes[0].is_ok());
    assert!(outcomes[2].is_ok());
    match &outcomes[1].result {
        Err(AppError::Render { target_id, path, .. }) => {
            assert_eq!(target_id, "broken");
            assert!(!path.is_empty());
        }
        other => panic!("expected a render error, got {other:?}"),
    }

    let alone = generator.render_target(&ir, "python").unwrap();
    assert_eq!(outcomes[0].result.as_ref().unwrap(), &alone);
}
