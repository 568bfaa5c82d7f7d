//! Account command handlers.
//!
//! The CLI keeps no state between runs. `login` prints the token so it can
//! be exported as `SHOPFRONT_AUTH_TOKEN` for later commands.

use shopfront_client::ApiClient;
use shopfront_core::{RegisterRequest, UserProfile};

/// # Errors
///
/// Returns an error if the backend rejects the credentials or answers
/// without a token.
pub(crate) async fn run_login(client: &ApiClient, email: &str, password: &str) -> anyhow::Result<()> {
    let credentials = client.login(email, password).await?;
    let role = if credentials.role.is_empty() {
        "unknown"
    } else {
        credentials.role.as_str()
    };
    println!("signed in (role: {role})");
    println!("export SHOPFRONT_AUTH_TOKEN={}", credentials.token);
    Ok(())
}

/// # Errors
///
/// Returns an error if the backend rejects the registration.
pub(crate) async fn run_register(
    client: &ApiClient,
    name: &str,
    email: &str,
    password: &str,
    phone: Option<String>,
) -> anyhow::Result<()> {
    let mut request = RegisterRequest::new(name, email, password);
    request.phone = phone.filter(|p| !p.trim().is_empty());
    client.register(&request).await?;
    println!("registered {}; sign in with `shopfront login`", request.email);
    Ok(())
}

/// # Errors
///
/// Returns an error if the backend rejected the session token.
pub(crate) async fn run_logout(client: &ApiClient) -> anyhow::Result<()> {
    if !client.session().is_authenticated() {
        println!("not signed in");
        return Ok(());
    }
    client.logout().await?;
    println!("signed out; unset SHOPFRONT_AUTH_TOKEN");
    Ok(())
}

/// # Errors
///
/// Returns an error if there is no session or the backend rejects it.
pub(crate) async fn run_whoami(client: &ApiClient) -> anyhow::Result<()> {
    let Some(user) = client.current_user().await? else {
        println!("signed in, but the profile could not be loaded");
        return Ok(());
    };

    println!("#{} {}", user.id, user.name.as_deref().unwrap_or("(no name)"));
    if let Some(email) = &user.email {
        println!("Email: {email}");
    }
    if let Some(phone) = &user.phone {
        println!("Phone: {phone}");
    }
    if let Some(role) = user.role.as_deref().or(client.session().role().as_deref()) {
        println!("Role: {role}");
    }
    if let Some(address) = user.default_address() {
        println!("Address: {}", address.display_line());
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if there is no session or the backend rejects it.
pub(crate) async fn run_addresses(client: &ApiClient) -> anyhow::Result<()> {
    let Some(user) = client.current_user().await? else {
        println!("signed in, but the profile could not be loaded");
        return Ok(());
    };
    let lines = address_lines(&user);
    if lines.is_empty() {
        println!("no saved addresses");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// One line per saved address, the checkout default marked with `*`. A
/// profile without an address book lists its inline address, if any.
fn address_lines(user: &UserProfile) -> Vec<String> {
    if user.addresses.is_empty() {
        return user
            .default_address()
            .map(|a| format!("* {}", a.display_line()))
            .into_iter()
            .collect();
    }

    let default_index = user.addresses.iter().position(|a| a.is_default).unwrap_or(0);
    user.addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            let marker = if i == default_index { '*' } else { ' ' };
            let contact: Vec<&str> = [address.name.as_deref(), address.phone.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if contact.is_empty() {
                format!("{marker} {}", address.display_line())
            } else {
                format!("{marker} {} ({})", address.display_line(), contact.join(", "))
            }
        })
        .collect()
}
