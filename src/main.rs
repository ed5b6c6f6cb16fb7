use std::error::Error;
use std::process;

use clap::{Arg, ArgMatches, Command};
use itertools::Itertools;

use trade_academy::admin;
use trade_academy::auth::password::{describe_password_error, read_password, validate_password};
use trade_academy::auth::AuthError;
use trade_academy::security::{SecureMasterKey, SessionTokenSlot};
use trade_academy::store::{FileStore, Role, StoreError};
use trade_academy::utils::io::{is_valid_email, prompt};
use trade_academy::utils::logging::initialize_logging;
use trade_academy::utils::time::{format_remaining, format_timestamp};
use trade_academy::{AuthService, Principal, ACCOUNTS_FILE};

fn main() {
    if let Err(e) = initialize_logging() {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    // Define the command-line interface using clap
    let matches = Command::new("trade-academy")
        .about("Account and session management for the trading education platform")
        .subcommand_required(true)
        .subcommand(
            Command::new("register")
                .about("Create a new account and log in")
                .arg(Arg::new("email").help("Email address (prompted if omitted)"))
                .arg(Arg::new("username").help("Display username (prompted if omitted)")),
        )
        .subcommand(
            Command::new("login")
                .about("Log in to an existing account")
                .arg(Arg::new("email").help("Email address (prompted if omitted)")),
        )
        .subcommand(Command::new("whoami").about("Show the currently logged-in identity"))
        .subcommand(Command::new("logout").about("End the current session"))
        .subcommand(
            Command::new("users")
                .about("Operator account management")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List all accounts"))
                .subcommand(
                    Command::new("grant-access")
                        .about("Grant a user access to paid content")
                        .arg(Arg::new("username").required(true)),
                )
                .subcommand(
                    Command::new("revoke-access")
                        .about("Revoke a user's access to paid content")
                        .arg(Arg::new("username").required(true)),
                )
                .subcommand(
                    Command::new("set-role")
                        .about("Change a user's role")
                        .arg(Arg::new("username").required(true))
                        .arg(Arg::new("role").help("user or admin").required(true)),
                ),
        )
        .get_matches(); // Parse the command-line arguments

    // The master key lives in the system keyring and encrypts the account
    // store at rest
    let master = SecureMasterKey::new()?;
    master.initialize_if_needed()?;
    let store = FileStore::open(ACCOUNTS_FILE, master.get_key()?)?;
    let auth = AuthService::new(&store, &store);

    match matches.subcommand() {
        Some(("register", sub)) => handle_register(&auth, sub),
        Some(("login", sub)) => handle_login(&auth, sub),
        Some(("whoami", _)) => handle_whoami(&auth, &store),
        Some(("logout", _)) => handle_logout(&auth),
        Some(("users", sub)) => handle_users(&store, sub),
        _ => unreachable!("subcommand_required is set"),
    }
}

fn handle_register(
    auth: &AuthService<&FileStore, &FileStore>,
    sub: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let email = arg_or_prompt(sub, "email", "Email")?;
    let username = arg_or_prompt(sub, "username", "Username")?;

    // Shape and strength checks are this front end's own policy; the core
    // only requires presence
    if !is_valid_email(&email) {
        return Err("that does not look like an email address".into());
    }

    println!("Choose a password:");
    let password = read_password()?;
    if let Err(e) = validate_password(&password) {
        return Err(describe_password_error(&e).into());
    }
    println!("Confirm password:");
    if read_password()? != password {
        return Err("passwords do not match".into());
    }

    let session = auth.register(&email, &username, &password)?;
    SessionTokenSlot::new()?.store(&session.token)?;

    println!("Account created. Welcome, {}!", session.principal.username);
    print_principal(&session.principal);
    Ok(())
}

fn handle_login(
    auth: &AuthService<&FileStore, &FileStore>,
    sub: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let email = arg_or_prompt(sub, "email", "Email")?;

    println!("Password:");
    let password = read_password()?;

    let session = auth.login(&email, &password)?;
    SessionTokenSlot::new()?.store(&session.token)?;

    println!("Welcome back, {}!", session.principal.username);
    print_principal(&session.principal);
    Ok(())
}

fn handle_whoami(
    auth: &AuthService<&FileStore, &FileStore>,
    store: &FileStore,
) -> Result<(), Box<dyn Error>> {
    let slot = SessionTokenSlot::new()?;
    let token = match slot.get() {
        Some(token) => token,
        None => {
            println!("Not logged in.");
            return Ok(());
        }
    };

    match auth.current_identity(&token) {
        Ok(principal) => {
            print_principal(&principal);
            if let Some(expires_at) = store.session_expires_at(&token)? {
                println!("  session:  expires in {}", format_remaining(expires_at));
            }
            Ok(())
        }
        Err(AuthError::Unauthenticated) => {
            // The stored token expired or was invalidated server-side
            slot.clear()?;
            println!("Session expired. Please log in again.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_logout(auth: &AuthService<&FileStore, &FileStore>) -> Result<(), Box<dyn Error>> {
    let slot = SessionTokenSlot::new()?;
    if let Some(token) = slot.get() {
        auth.logout(&token)?;
    }
    // Clearing an empty slot is fine; logout is idempotent end to end
    slot.clear()?;
    println!("Logged out.");
    Ok(())
}

fn handle_users(store: &FileStore, sub: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match sub.subcommand() {
        Some(("list", _)) => {
            let users = admin::list_users(&store)?;
            if users.is_empty() {
                println!("No accounts yet.");
                return Ok(());
            }
            for user in users
                .iter()
                .sorted_by(|a, b| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
            {
                println!(
                    "{:<20} {:<30} role={:<6} access={:<5} since {}",
                    user.username,
                    user.email,
                    format!("{:?}", user.role).to_lowercase(),
                    user.has_access,
                    format_timestamp(user.created_at)
                );
            }
            Ok(())
        }
        Some(("grant-access", args)) => {
            let user = admin::grant_access(&store, required_arg(args, "username"))
                .map_err(store_error_message)?;
            println!("Access granted for {}.", user.username);
            Ok(())
        }
        Some(("revoke-access", args)) => {
            let user = admin::revoke_access(&store, required_arg(args, "username"))
                .map_err(store_error_message)?;
            println!("Access revoked for {}.", user.username);
            Ok(())
        }
        Some(("set-role", args)) => {
            let role = match required_arg(args, "role") {
                "admin" => Role::Admin,
                "user" => Role::User,
                other => return Err(format!("unknown role '{}'", other).into()),
            };
            let user = admin::set_user_role(&store, required_arg(args, "username"), role)
                .map_err(store_error_message)?;
            println!(
                "Role for {} is now {:?}.",
                user.username,
                user.role
            );
            Ok(())
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

fn arg_or_prompt(matches: &ArgMatches, name: &str, label: &str) -> Result<String, Box<dyn Error>> {
    match matches.get_one::<String>(name) {
        Some(value) => Ok(value.clone()),
        None => Ok(prompt(label)?),
    }
}

fn required_arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    // Arguments marked required(true); clap guarantees presence
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

fn store_error_message(err: StoreError) -> Box<dyn Error> {
    match err {
        StoreError::NotFound => "no account with that username".into(),
        other => other.to_string().into(),
    }
}

fn print_principal(principal: &Principal) {
    println!("  id:       {}", principal.id);
    println!("  username: {}", principal.username);
    println!("  email:    {}", principal.email);
    println!("  role:     {:?}", principal.role);
    println!(
        "  access:   {}",
        if principal.has_access {
            "full course access"
        } else {
            "free content only"
        }
    );
}
