use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::UNIX_EPOCH};

use musica_catalog_server::user::{
    AccountManager, SqliteUserStore, UserAuthCredentialsStore, DEFAULT_SESSION_IDLE_DAYS,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the account database (`user.db`). Looked up from the current
    /// directory upwards when omitted.
    #[clap(value_parser = parse_path)]
    pub path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates an account with the given username and password.
    AddAccount { username: String, password: String },

    /// Changes the password of an existing account.
    UpdatePassword { username: String, password: String },

    /// Verifies the password of an account. It doesn't make any persistent
    /// change nor creates a session, it just compares the password hash.
    CheckPassword { username: String, password: String },

    /// Shows all usernames.
    Accounts,

    /// Shows the sessions of an account.
    Sessions { username: String },

    /// Deletes every session of an account, logging it out everywhere.
    RevokeSessions { username: String },

    /// Deletes sessions that have been idle for longer than the given days.
    PruneSessions {
        #[clap(default_value_t = DEFAULT_SESSION_IDLE_DAYS)]
        idle_days: u64,
    },

    /// Shows the path of the current account db.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

struct ShellContext<'a> {
    user_store: &'a Arc<SqliteUserStore>,
    account_manager: &'a AccountManager,
    db_path: String,
}

fn format_timestamp(time: std::time::SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => chrono::DateTime::from_timestamp(since_epoch.as_secs() as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "?".to_owned()),
        Err(_) => "?".to_owned(),
    }
}

fn execute_command(line: String, ctx: &ShellContext) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match cli.command {
                InnerCommand::AddAccount { username, password } => {
                    match ctx.account_manager.register(&username, &password) {
                        Ok(account_id) => println!("Created account {} ({})", username, account_id),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::UpdatePassword { username, password } => {
                    if let Err(err) = ctx.account_manager.update_password(&username, &password) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    println!("Password of {} updated.", username);
                }
                InnerCommand::CheckPassword { username, password } => {
                    let credentials = match ctx.user_store.get_password_credentials(&username) {
                        Ok(Some(x)) => x,
                        Ok(None) => {
                            return CommandExecutionResult::Error(format!(
                                "Account {} not found.",
                                username
                            ));
                        }
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    };
                    let msg = match credentials.password.verify(&password) {
                        Ok(true) => "The password provided is correct!".to_owned(),
                        Ok(false) => "Wrong password.".to_owned(),
                        Err(err) => format!(
                            "Could not verify the password, something went wrong: {}",
                            err
                        ),
                    };
                    println!("{}", msg);
                }
                InnerCommand::Accounts => match ctx.account_manager.get_all_usernames() {
                    Ok(usernames) => println!("{:#?}", usernames),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Sessions { username } => {
                    let sessions = match ctx.account_manager.get_sessions(&username) {
                        Ok(x) => x,
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    };
                    if sessions.is_empty() {
                        println!("(no sessions)");
                    }
                    for token in sessions.iter() {
                        println!(
                            "  {}... created {} last used {}",
                            &token.value.0[..8.min(token.value.0.len())],
                            format_timestamp(token.created),
                            token
                                .last_used
                                .map(format_timestamp)
                                .unwrap_or_else(|| "never".to_owned())
                        );
                    }
                }
                InnerCommand::RevokeSessions { username } => {
                    match ctx.account_manager.revoke_sessions(&username) {
                        Ok(count) => println!("Revoked {} session(s) of {}", count, username),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::PruneSessions { idle_days } => {
                    let manager = AccountManager::new(ctx.user_store.clone(), idle_days);
                    match manager.prune_idle_sessions() {
                        Ok(count) => println!("Pruned {} idle session(s)", count),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::Where => {
                    println!("{}", ctx.db_path);
                }
                InnerCommand::Exit => return CommandExecutionResult::Exit,
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct CommandsHelper {
    commands_names: Vec<String>,
}

impl CommandsHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandsHelper { commands_names }
    }
}

impl Completer for CommandsHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandsHelper {}
impl Validator for CommandsHelper {}
impl Helper for CommandsHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let user_db_path = match cli_args.path {
        Some(path) => path,
        None => SqliteUserStore::infer_path().with_context(|| {
            "Could not infer the account db file path, please specify it explicitly."
        })?,
    };
    let user_store = Arc::new(SqliteUserStore::new(&user_db_path)?);
    let account_manager = AccountManager::new(user_store.clone(), DEFAULT_SESSION_IDLE_DAYS);
    let ctx = ShellContext {
        user_store: &user_store,
        account_manager: &account_manager,
        db_path: user_db_path.display().to_string(),
    };

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandsHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandsHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &ctx) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
