//! Operator CLI for the ATM cash inventory.
//!
//! # Responsibility
//! - Run ledger operations directly against the inventory database.
//! - Print JSON bodies matching the HTTP responses.
//!
//! # Usage
//!
//! ```bash
//! atm_cli balance
//! atm_cli add 100 5
//! atm_cli deposit 100=2 50=4
//! atm_cli withdraw 150
//! ```
//!
//! The database path comes from `ATM_DB_PATH`; logs go to `ATM_LOG_DIR` at
//! `ATM_LOG_LEVEL`, with the same defaults as the server.

use atm_core::db::open_db;
use atm_core::{
    core_version, default_log_level, init_logging, DenominationRecord, DepositRequest, Inventory,
    LedgerError, LedgerService, SqliteDenominationRepository,
};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::process;

const DB_PATH_VAR: &str = "ATM_DB_PATH";
const LOG_LEVEL_VAR: &str = "ATM_LOG_LEVEL";
const LOG_DIR_VAR: &str = "ATM_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "atm_inventory.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "atm-logs";
const USAGE: &str = "usage: atm_cli <balance | add <denom> [qty] | deposit <denom>=<count>... | withdraw <amount> | version>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Version,
    Ledger(LedgerCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LedgerCommand {
    Balance,
    Add(DenominationRecord),
    Deposit(DepositRequest),
    Withdraw(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    db_path: PathBuf,
    log_level: String,
    log_dir: PathBuf,
}

#[derive(Serialize)]
struct VersionBody {
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<&'a Inventory>,
}

impl ErrorBody<'_> {
    fn message(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            balance: None,
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            process::exit(2);
        }
    };

    let outcome = match command {
        Command::Version => render(&VersionBody {
            version: core_version(),
        }),
        Command::Ledger(command) => run(command),
    };

    match outcome {
        Ok(body) => println!("{body}"),
        Err(body) => {
            println!("{body}");
            process::exit(1);
        }
    }
}

fn run(command: LedgerCommand) -> Result<String, String> {
    let settings = settings_from(|key| env::var(key).ok());
    init_logging(&settings.log_level, &settings.log_dir.to_string_lossy())
        .map_err(|err| fail(&ErrorBody::message(err)))?;

    let conn = open_db(&settings.db_path).map_err(|err| fail(&ErrorBody::message(err)))?;
    let repo = SqliteDenominationRepository::try_new(&conn)
        .map_err(|err| fail(&ErrorBody::message(err)))?;
    let ledger = LedgerService::new(repo);

    match command {
        LedgerCommand::Balance => ledger
            .balance()
            .map_err(ledger_failure)
            .and_then(|r| render(&r)),
        LedgerCommand::Add(record) => ledger
            .add_denomination(record)
            .map_err(ledger_failure)
            .and_then(|r| render(&r)),
        LedgerCommand::Deposit(request) => ledger
            .deposit(&request)
            .map_err(ledger_failure)
            .and_then(|r| render(&r)),
        LedgerCommand::Withdraw(amount) => ledger
            .withdraw(amount)
            .map_err(ledger_failure)
            .and_then(|r| render(&r)),
    }
}

fn render<T: Serialize>(body: &T) -> Result<String, String> {
    serde_json::to_string_pretty(body).map_err(|err| fail(&ErrorBody::message(err)))
}

fn fail(body: &ErrorBody<'_>) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.error.clone())
}

fn ledger_failure(err: LedgerError) -> String {
    fail(&ErrorBody {
        error: err.to_string(),
        balance: err.balance(),
    })
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args
        .split_first()
        .ok_or_else(|| "missing command".to_string())?;

    match (name.as_str(), rest) {
        ("balance", []) => Ok(Command::Ledger(LedgerCommand::Balance)),
        ("version", []) => Ok(Command::Version),
        ("add", [denomination]) => Ok(Command::Ledger(LedgerCommand::Add(
            DenominationRecord::new(parse_number(denomination, "denomination")?, 0),
        ))),
        ("add", [denomination, quantity]) => Ok(Command::Ledger(LedgerCommand::Add(
            DenominationRecord::new(
                parse_number(denomination, "denomination")?,
                parse_number(quantity, "quantity")?,
            ),
        ))),
        ("deposit", pairs) if !pairs.is_empty() => {
            let mut request = DepositRequest::new();
            for pair in pairs {
                let (denomination, count) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected <denom>=<count>, got `{pair}`"))?;
                request.insert(
                    parse_number(denomination, "denomination")?,
                    parse_number(count, "count")?,
                );
            }
            Ok(Command::Ledger(LedgerCommand::Deposit(request)))
        }
        ("withdraw", [amount]) => {
            let amount = parse_number(amount, "amount")?;
            Ok(Command::Ledger(LedgerCommand::Withdraw(amount)))
        }
        (other, _) => Err(format!("unknown or malformed command `{other}`")),
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, String> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| format!("invalid {what} `{raw}`"))
}

fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let value_of = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Settings {
        db_path: value_of(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
        log_level: value_of(LOG_LEVEL_VAR).unwrap_or_else(|| default_log_level().to_string()),
        log_dir: value_of(LOG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, settings_from, Command, LedgerCommand};
    use atm_core::DenominationRecord;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_deposit_pairs() {
        let command = parse_command(&args(&["deposit", "100=2", "50=-1"])).unwrap();
        let Command::Ledger(LedgerCommand::Deposit(request)) = &command else {
            panic!("expected deposit, got {command:?}");
        };
        assert_eq!(request.get(&100), Some(&2));
        assert_eq!(request.get(&50), Some(&-1));
    }

    #[test]
    fn add_defaults_quantity_to_zero() {
        assert_eq!(
            parse_command(&args(&["add", "20"])).unwrap(),
            Command::Ledger(LedgerCommand::Add(DenominationRecord::new(20, 0)))
        );
    }

    #[test]
    fn withdraw_accepts_negative_numbers_for_ledger_validation() {
        assert_eq!(
            parse_command(&args(&["withdraw", "-5"])).unwrap(),
            Command::Ledger(LedgerCommand::Withdraw(-5))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_command(&args(&[])).is_err());
        assert!(parse_command(&args(&["deposit"])).is_err());
        assert!(parse_command(&args(&["deposit", "100"])).is_err());
        assert!(parse_command(&args(&["withdraw", "ten"])).is_err());
        assert!(parse_command(&args(&["shred"])).is_err());
    }

    #[test]
    fn settings_read_log_variables_with_server_defaults() {
        let defaults = settings_from(|_| None);
        assert!(defaults.db_path.ends_with("atm_inventory.sqlite3"));
        assert!(defaults.log_dir.ends_with("atm-logs"));
        assert_eq!(defaults.log_level, atm_core::default_log_level());

        let explicit = settings_from(|key| match key {
            "ATM_LOG_LEVEL" => Some(" warn ".to_string()),
            "ATM_LOG_DIR" => Some("/var/log/atm".to_string()),
            "ATM_DB_PATH" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(explicit.log_level, "warn");
        assert_eq!(explicit.log_dir.to_str(), Some("/var/log/atm"));
        assert!(explicit.db_path.ends_with("atm_inventory.sqlite3"));
    }
}
