use std::io;

use jobsh::config::{Config, ConfigLoader};
use jobsh::executor::DefaultExecutor;
use jobsh::logging;
use jobsh::prompt::ShellPrompt;
use jobsh::repl::Repl;
use jobsh::terminal::Terminal;

fn main() {
    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("jobsh: config: {e}");
            Config::default()
        }
    };
    logging::init(config.log_level);

    if config.banner {
        println!("jobsh: pipes, redirection, background jobs");
        println!("Type 'exit' to quit the shell.");
    }

    let executor = DefaultExecutor::new(Terminal::detect());
    let mut repl = Repl::new(executor, ShellPrompt::new(config.prompt));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let code = match repl.run(&mut stdin.lock(), &mut stdout.lock()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("jobsh: {e}");
            1
        }
    };

    if config.banner {
        println!("Exiting shell... Goodbye!");
    }
    // end the session (drops the job table) before leaving
    drop(repl);
    std::process::exit(code);
}
