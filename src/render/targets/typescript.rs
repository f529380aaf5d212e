//! TypeScript flavor of the commander target.
//!
//! The command tree templates are shared with [`super::nodejs`]; this module
//! holds the typed runtime, the typed hook stubs and the compiler setup.

use super::nodejs::CommanderRenderer;
use crate::render::traits::Renderer;

pub fn factory() -> Box<dyn Renderer> {
    Box::new(CommanderRenderer::typescript())
}

const CLI: &str = r#"#!/usr/bin/env node
// {{cli_name}} command-line interface.
//
// Generated by cli-forge. Do not edit this file; implement commands in
// src/hooks.ts.

import { Argument, Command, InvalidArgumentError, Option } from "commander";
import * as hooksModule from "./src/hooks";

type Values = Record<string, unknown>;
type Hook = (...params: unknown[]) => unknown;

const hooks: Record<string, unknown> = { ...hooksModule };

const GENERIC_HOOK = {{js_str generic}};

class UnboundCommandError extends Error {
  readonly commandPath: string[];
  readonly tried: string[];

  constructor(commandPath: string[], tried: string[]) {
    super(`Command '${commandPath.join(" ")}' is not bound (tried: ${tried.join(", ")})`);
    this.name = "UnboundCommandError";
    this.commandPath = commandPath;
    this.tried = tried;
  }
}

function parseInteger(value: string): number {
  const parsed = Number.parseInt(value, 10);
  if (Number.isNaN(parsed) || String(parsed) !== value.trim()) {
    throw new InvalidArgumentError("Not an integer.");
  }
  return parsed;
}

function parseNumber(value: string): number {
  const parsed = Number(value);
  if (value.trim() === "" || Number.isNaN(parsed)) {
    throw new InvalidArgumentError("Not a number.");
  }
  return parsed;
}

function parseBoolean(value: string): boolean {
  const normalized = value.trim().toLowerCase();
  if (["1", "true", "yes", "on"].includes(normalized)) {
    return true;
  }
  if (["0", "false", "no", "off"].includes(normalized)) {
    return false;
  }
  throw new InvalidArgumentError("Not a boolean.");
}

function collect(command: Command, args: unknown[], names: string[]): Values {
  const values: Values = {};
  names.forEach((name, index) => {
    values[name] = args[index];
  });
  return Object.assign(values, command.optsWithGlobals());
}

function isClass(value: unknown): value is new () => Record<string, unknown> {
  return typeof value === "function" && /^class[\s{]/.test(Function.prototype.toString.call(value));
}

async function invoke(commandPath: string[], candidates: string[], values: Values): Promise<unknown> {
  for (const name of candidates) {
    const hook = hooks[name];
    if (typeof hook !== "function") {
      continue;
    }
    if (name === GENERIC_HOOK) {
      return (hook as Hook)(commandPath, values);
    }
    return (hook as Hook)(values);
  }
  throw new UnboundCommandError(commandPath, candidates);
}

async function invokeManaged(
  commandPath: string[],
  controllers: string[],
  action: string,
  candidates: string[],
  values: Values,
): Promise<unknown> {
  for (const name of controllers) {
    const target = hooks[name];
    if (target === undefined) {
      continue;
    }
    const controller = (isClass(target) ? new target() : target) as Record<string, unknown>;
    const method = controller?.[action];
    if (typeof method === "function") {
      return (method as Hook).call(controller, values);
    }
  }
  return invoke([...commandPath, action], candidates, values);
}

async function dispatchGroup(
  command: Command,
  commandPath: string[],
  candidates: string[],
  values: Values,
): Promise<unknown> {
  for (const name of candidates) {
    if (name !== GENERIC_HOOK && typeof hooks[name] === "function") {
      return invoke(commandPath, [name], values);
    }
  }
  command.help();
}

const program = new Command();
program
  .name({{js_str cli_name}})
  .description({{js_str description}})
  .version({{js_str version}})
{{global_params}};

{{commands_code}}program.parseAsync(process.argv).catch((error: unknown) => {
  if (error instanceof UnboundCommandError) {
    console.error(`${program.name()}: ${error.message}`);
    process.exit(2);
  }
  console.error(error);
  process.exit(1);
});
"#;

const STUB_COMMAND: &str = r#"/** {{one_line description}} */
export async function {{canonical_name}}({{#if destructure}}{{destructure}}: Values{{/if}}): Promise<void> {
  console.log("{{path_display}}: not implemented yet");
}

"#;

const STUB_CONTROLLER: &str = r#"/** {{one_line description}} */
export class {{controller}} {
{{#each actions}}
  async {{action}}(values: Values): Promise<void> {
    console.log("{{../path_display}} {{action}}: not implemented yet", values);
  }
{{/each}}
}

"#;

const HOOKS: &str = r#"// Hook implementations for {{cli_name}}.
//
// cli-forge creates this file once and never overwrites it. Each command of
// the generated CLI calls the first of its candidate names exported here.

export type Values = Record<string, unknown>;

{{stubs}}// Catch-all for commands without a dedicated hook:
//
// export async function {{generic}}(commandPath: string[], values: Values): Promise<void> {
//   console.log(commandPath.join(" "), values);
// }
"#;

const PACKAGE: &str = r#"{
  "name": {{js_str cli_name}},
  "version": {{js_str version}},
  "description": {{js_str tagline}},
  "main": "dist/cli.js",
  "bin": {
    {{js_str cli_name}}: "dist/cli.js"
  },
  "files": ["dist/"],
  "scripts": {
    "build": "tsc",
    "prepare": "tsc"
  },
  "engines": {
    "node": ">=18"
  },
  "dependencies": {
    "commander": "^12.1.0"
  },
  "devDependencies": {
    "@types/node": "^20.14.0",
    "typescript": "^5.5.0"
  }
}
"#;

const TSCONFIG: &str = r#"{
  "compilerOptions": {
    "target": "ES2020",
    "module": "commonjs",
    "rootDir": ".",
    "outDir": "dist",
    "strict": true,
    "esModuleInterop": true,
    "skipLibCheck": true
  },
  "include": ["cli.ts", "src/**/*.ts"]
}
"#;

const SETUP: &str = r#"#!/usr/bin/env bash
# Build {{cli_name}} and link it onto the PATH.
set -euo pipefail

cd "$(dirname "$0")"

if ! command -v npm >/dev/null 2>&1; then
    echo "npm is required to install {{cli_name}}" >&2
    exit 1
fi

npm install
npm run build
npm link
echo "{{cli_name}} installed. Run '{{cli_name}} --help' to get started."
"#;

/// File and stub templates registered next to the shared commander ones
pub(super) fn templates() -> Vec<(&'static str, &'static str)> {
    vec![
        ("typescript/cli", CLI),
        ("typescript/stub_command", STUB_COMMAND),
        ("typescript/stub_controller", STUB_CONTROLLER),
        ("typescript/hooks", HOOKS),
        ("typescript/package", PACKAGE),
        ("typescript/tsconfig", TSCONFIG),
        ("typescript/setup", SETUP),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TreeBuilder;
    use crate::render::artifact::{Artifact, ArtifactKind};
    use crate::render::RenderOptions;
    use serde_json::{json, Value};

    fn render(doc: Value) -> Vec<Artifact> {
        let ir = TreeBuilder::new().build(&doc).unwrap();
        factory().render(&ir, &RenderOptions::default()).unwrap()
    }

    fn content<'a>(artifacts: &'a [Artifact], path: &str) -> &'a str {
        &artifacts.iter().find(|a| a.path == path).unwrap().content
    }

    #[test]
    fn test_layout_and_exec_bits() {
        let artifacts = render(json!({"name": "t", "commands": {"run": {"desc": "Run"}}}));
        let paths: Vec<_> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["cli.ts", "src/hooks.ts", "package.json", "tsconfig.json", "setup.sh"]
        );
        assert!(!artifacts[0].executable);
        assert_eq!(artifacts[3].kind(), ArtifactKind::Support);
        assert!(artifacts[4].executable);

        let tsconfig: Value = serde_json::from_str(content(&artifacts, "tsconfig.json")).unwrap();
        assert_eq!(tsconfig["compilerOptions"]["outDir"], "dist");
        let manifest: Value = serde_json::from_str(content(&artifacts, "package.json")).unwrap();
        assert_eq!(manifest["bin"]["t"], "dist/cli.js");
    }

    #[test]
    fn test_typed_stubs_and_runtime() {
        let artifacts = render(json!({"name": "greeter", "commands": {
            "hello": {"desc": "Say hello", "args": [{"name": "name"}]},
            "daemon": {"desc": "Daemon", "lifecycle": "managed"}
        }}));
        let cli = content(&artifacts, "cli.ts");
        assert!(cli.contains("import * as hooksModule from \"./src/hooks\";"));
        assert!(cli.contains(".action(async (...args: unknown[]) => {"));

        let hooks = content(&artifacts, "src/hooks.ts");
        assert!(hooks.contains("export async function onHello({ name }: Values): Promise<void> {"));
        assert!(hooks.contains("export class DaemonController {"));
        assert!(!hooks.contains("module.exports"));
    }
}
