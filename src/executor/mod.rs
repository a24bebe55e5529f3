mod builtins;
mod default_executor;
mod executor;
mod pipes;
mod redirect;
mod spawner;


pub use builtins::{BuiltinCommand, BuiltinManager};
pub use default_executor::DefaultExecutor;
pub use executor::{ExecOutcome, ExecStatus, Executor, ShellContext};
pub use pipes::{Pipe, PipeSet};
pub use redirect::{RedirectResolver, Redirections};
pub use spawner::{ProcessSpawner, Spawned};
