//! REPL (Read-Eval-Print Loop) for host scripts

use crate::config::RuntimeConfig;
use crate::error::report_error;
use crate::extract::describe;
use crate::interp::Evaluator;
use crate::runtime::Runtime;
use crate::value::HostValue;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".hostvec_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    evaluator: Evaluator,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new(config: RuntimeConfig) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let evaluator = Evaluator::new(Runtime::new(config));
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            evaluator,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("hostvec {}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }
                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :); returns true to exit
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":classes" => {
                for line in self.class_listing() {
                    println!("{line}");
                }
                false
            }
            ":stats" => {
                match serde_json::to_string_pretty(&self.evaluator.stats()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :classes        List native classes and their members");
        println!("  :stats          Show live object counts");
        println!("  :clear          Clear the screen");
        println!();
        println!("Statements:");
        println!("  let v = new TVec([3, 1, 2]);");
        println!("  v.push(4);");
        println!("  v.sort(false)");
        println!();
        println!("Built-in functions:");
        println!("  print(x, ...)   Print values; usable as a callback");
        println!("  release(h)      Release a native object");
        println!("  toJson(x)       Serialize a value to JSON text");
        println!("  fromJson(s)     Parse JSON text");
    }

    /// One line per class and member
    fn class_listing(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for class in self.evaluator.runtime().classes().iter() {
            lines.push(format!(
                "{} new {}{}",
                class.name,
                class.name,
                describe(class.constructor)
            ));
            for method in &class.methods {
                lines.push(format!("  .{} [{}]", method.render(), method.kind));
            }
            for accessor in &class.accessors {
                lines.push(format!("  .{accessor}"));
            }
        }
        lines
    }

    /// Run one line and print its output and value
    fn eval_input(&mut self, input: &str) {
        let result = self.evaluator.run_source(input);
        for line in self.evaluator.take_output() {
            println!("{line}");
        }
        match result {
            Ok(HostValue::Undefined) => {}
            Ok(value) => println!("{}", self.evaluator.render(&value)),
            Err(e) => {
                if report_error("<repl>", input, &e).is_err() {
                    eprintln!("Error: {e}");
                }
            }
        }
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
