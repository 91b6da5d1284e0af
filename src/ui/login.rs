use crate::api::client::ApiClient;
use crate::api::models::SessionUser;
use crate::app::AppState;
use crate::error::Result;
use crate::utils::{Console, normalize_url};
use crate::validation::{RegistrationForm, ValidationError, require, validate_email};

enum Choice {
    Login,
    Register,
    Server,
    Quit,
}

fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim().to_lowercase().as_str() {
        "" | "l" | "login" => Some(Choice::Login),
        "r" | "register" => Some(Choice::Register),
        "s" | "server" => Some(Choice::Server),
        "q" | "quit" => Some(Choice::Quit),
        _ => None,
    }
}

/// Asks for the backend URL until a usable one is given. `false` on end of input.
async fn ask_server(state: &mut AppState, console: &mut Console) -> Result<bool> {
    loop {
        let Some(input) = console.prompt("Server URL (e.g. http://10.0.2.2/diyshop/api): ").await? else {
            return Ok(false);
        };
        let url = normalize_url(&input);
        if url.is_empty() {
            println!("Please enter the server URL.");
            continue;
        }
        match ApiClient::new(&url) {
            Ok(_) => {
                state.base_url = url;
                return Ok(true);
            }
            Err(e) => println!("{e}"),
        }
    }
}

/// Login only needs a password; the length rule is for new accounts.
fn check_login(email: &str, password: &str) -> std::result::Result<String, ValidationError> {
    let email = validate_email(email)?;
    require("password", password)?;
    Ok(email)
}

async fn login_form(client: &ApiClient, console: &mut Console) -> Result<Option<SessionUser>> {
    let Some(email) = console.prompt("Email: ").await? else { return Ok(None) };
    let password = console.password("Password").await?;
    let email = match check_login(&email, &password) {
        Ok(email) => email,
        Err(e) => {
            println!("{e}");
            return Ok(None);
        }
    };
    match client.login(&email, &password).await {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            log::warn!("login failed: {e}");
            println!("Login failed: {e}");
            Ok(None)
        }
    }
}

async fn register_form(client: &ApiClient, console: &mut Console) -> Result<Option<SessionUser>> {
    let mut form = RegistrationForm::default();
    for (label, field) in [
        ("Full name: ", &mut form.name),
        ("Email: ", &mut form.email),
        ("Phone: ", &mut form.phone),
    ] {
        let Some(value) = console.prompt(label).await? else { return Ok(None) };
        *field = value;
    }
    form.password = console.password("Password").await?;
    form.confirm_password = console.password("Confirm password").await?;
    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => {
            println!("{e}");
            return Ok(None);
        }
    };
    match client.register(&request).await {
        Ok(user) => {
            log::info!("registered user {}", user.id);
            println!("Welcome, {}!", user.name);
            Ok(Some(user))
        }
        Err(e) => {
            println!("Registration failed: {e}");
            Ok(None)
        }
    }
}

/// Login / register screen. Returns `false` when the user quits or input ends.
pub async fn show_login(state: &mut AppState, console: &mut Console) -> Result<bool> {
    println!("Welcome to DIY Shop");
    if !state.is_configured() && !ask_server(state, console).await? {
        return Ok(false);
    }

    loop {
        let Some(input) = console.prompt("[l]ogin, [r]egister, [s]erver, [q]uit: ").await? else {
            return Ok(false);
        };
        let client = match ApiClient::new(&state.base_url) {
            Ok(client) => client,
            Err(e) => {
                println!("{e}");
                if !ask_server(state, console).await? {
                    return Ok(false);
                }
                continue;
            }
        };
        let user = match parse_choice(&input) {
            Some(Choice::Login) => login_form(&client, console).await?,
            Some(Choice::Register) => register_form(&client, console).await?,
            Some(Choice::Server) => {
                if !ask_server(state, console).await? {
                    return Ok(false);
                }
                None
            }
            Some(Choice::Quit) => return Ok(false),
            None => {
                println!("Unknown choice.");
                None
            }
        };
        let Some(user) = user else { continue };

        state.remember_me = console.confirm("Remember me?", false).await?;
        state.user = Some(user);
        if let Err(e) = state.save() {
            println!("Failed to save settings: {e}");
        }
        return Ok(true);
    }
}
