// ============================================================================
// Interactive shell - one screen at a time, one command per line
// ============================================================================

use anyhow::{anyhow, bail, Result};
use shoplist_core::remote::SyncQueue;
use shoplist_core::types::{MessageKind, Screen};
use shoplist_core::{AppConfig, Prompter, ShoplistDb, ShoppingApp, WebhookClient};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;

/// Yes/no questions answered on stdin
struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str) -> bool {
        match read_line(&format!("{} [y/N] ", message)) {
            Ok(Some(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim"),
            _ => false,
        }
    }
}

/// Prompt and read one line. `None` on end of input.
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

pub async fn run(db: ShoplistDb, config: &AppConfig) -> Result<()> {
    let backend = Arc::new(WebhookClient::new(&config.webhook_base_url, config.request_timeout())?);
    let queue = Arc::new(SyncQueue::spawn(backend.clone()));
    let mut app = ShoppingApp::new(Arc::new(db), backend, queue.clone(), Box::new(StdinPrompter));

    if app.restore_session().await {
        println!("Welcome back, {}", app.state().email);
    }

    loop {
        render(&app);

        let Some(line) = read_line("> ")? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = words.first() else {
            continue;
        };
        if matches!(command, "quit" | "exit" | "q") {
            break;
        }

        let screen = app.state().screen;
        let result = match screen {
            Screen::Login => login_screen(&mut app, &words).await,
            Screen::Home => home_screen(&mut app, &words).await,
            Screen::Template => template_screen(&mut app, &words, &line),
            Screen::MonthBuilder => month_screen(&mut app, &words),
            Screen::Purchase => purchase_screen(&mut app, &words),
        };
        if let Err(e) = result {
            println!("! {}", e);
        }
    }

    let stats = queue.shutdown().await;
    info!("Shell closed ({} notifications delivered)", stats.delivered);
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn render(app: &ShoppingApp) {
    let state = app.state();
    println!();
    println!("=== {} ===", state.screen);

    match state.screen {
        Screen::Login => {
            if let Some(msg) = &state.login_message {
                let mark = match msg.kind {
                    MessageKind::Info => "..",
                    MessageKind::Success => "ok",
                    MessageKind::Error => "!!",
                };
                println!("[{}] {}", mark, msg.text);
            }
            println!("Commands: login <email>, quit");
        }
        Screen::Home => {
            println!("Logged in as {}", state.email);
            println!("Theme: {}", if state.dark_mode { "dark" } else { "light" });
            match state.tracker.active() {
                Some(list) => println!("Active list: {}", list.reference_month),
                None => println!("No active list"),
            }
            println!("Commands: template, month, purchase, theme, reload, logout, quit");
        }
        Screen::Template => {
            for (c, (label, items)) in state.template.categories().iter().enumerate() {
                let target = if state.item_category.as_deref() == Some(label.as_str()) { " <- new items" } else { "" };
                println!("{}. {}{}", c + 1, label, target);
                for (i, item) in items.iter().enumerate() {
                    println!("   {}.{} {}", c + 1, i + 1, item.name);
                }
            }
            if state.template.is_empty() {
                println!("(empty template)");
            }
            println!("Commands: new <name>, use <cat>, add <name>, del <cat>, rm <cat> <item>, back");
        }
        Screen::MonthBuilder => {
            for (c, (label, items)) in state.template.categories().iter().enumerate() {
                println!("{}. {}", c + 1, label);
                for (i, item) in items.iter().enumerate() {
                    let mark = if state.builder.is_selected(label, &item.id) { "x" } else { " " };
                    println!("   [{}] {}.{} {}", mark, c + 1, i + 1, item.name);
                }
            }
            if state.template.is_empty() {
                println!("(empty template, create one first)");
            }
            println!("{} selected", state.builder.selected_count());
            println!("Commands: pick <cat> <item>, done, back");
        }
        Screen::Purchase => {
            match state.tracker.active() {
                Some(list) => {
                    println!("List: {}", list.reference_month);
                    for (c, (label, items)) in list.categories.iter().enumerate() {
                        println!("{}. {}", c + 1, label);
                        for (i, item) in items.iter().enumerate() {
                            let mark = if item.purchased { "x" } else { " " };
                            println!(
                                "   [{}] {}.{} {:<24} R$ {:.2}",
                                mark,
                                c + 1,
                                i + 1,
                                item.name,
                                item.price
                            );
                        }
                    }
                }
                None => println!("No active list"),
            }
            println!("Total: R$ {:.2}", app.total());
            println!("Commands: buy <cat> <item>, price <cat> <item> <value>, clear, finish, back");
        }
    }
}

// ============================================================================
// Screens
// ============================================================================

async fn login_screen(app: &mut ShoppingApp, words: &[&str]) -> Result<()> {
    match words {
        ["login", email] => {
            let Some(password) = read_line("Password: ")? else {
                return Ok(());
            };
            app.login(email, &password).await?;
            Ok(())
        }
        _ => bail!("Unknown command. Try: login <email>"),
    }
}

async fn home_screen(app: &mut ShoppingApp, words: &[&str]) -> Result<()> {
    match words {
        ["template"] => app.navigate(Screen::Template)?,
        ["month"] => app.navigate(Screen::MonthBuilder)?,
        ["purchase"] => app.navigate(Screen::Purchase)?,
        ["theme"] => {
            app.toggle_theme();
        }
        ["reload"] => {
            if !app.hydrate_template().await {
                println!("Template unchanged");
            }
        }
        ["logout"] => app.logout(),
        _ => bail!("Unknown command"),
    }
    Ok(())
}

fn template_screen(app: &mut ShoppingApp, words: &[&str], line: &str) -> Result<()> {
    match words {
        ["new", ..] => {
            let label = app.create_category(rest_after(line, "new"))?;
            println!("Created {}", label);
        }
        ["use", cat] => {
            let label = template_category(app, cat)?;
            app.select_item_category(&label)?;
        }
        ["add", ..] => {
            let target = app.state().item_category.clone().unwrap_or_default();
            let item = app.add_item(&target, rest_after(line, "add"))?;
            println!("Added {}", item.name);
        }
        ["del", cat] => {
            let label = template_category(app, cat)?;
            if !app.delete_category(&label)? {
                println!("Kept {}", label);
            }
        }
        ["rm", cat, item] => {
            let label = template_category(app, cat)?;
            let index = parse_index(item)?;
            let id = app
                .state()
                .template
                .items(&label)
                .and_then(|items| items.get(index))
                .map(|i| i.id.clone())
                .ok_or_else(|| anyhow!("No item {} in {}", item, label))?;
            app.delete_item(&label, &id)?;
        }
        ["back"] => app.navigate(Screen::Home)?,
        _ => bail!("Unknown command"),
    }
    Ok(())
}

fn month_screen(app: &mut ShoppingApp, words: &[&str]) -> Result<()> {
    match words {
        ["pick", cat, item] => {
            let label = template_category(app, cat)?;
            let index = parse_index(item)?;
            let id = app
                .state()
                .template
                .items(&label)
                .and_then(|items| items.get(index))
                .map(|i| i.id.clone())
                .ok_or_else(|| anyhow!("No item {} in {}", item, label))?;
            app.toggle_selection(&label, &id)?;
        }
        ["done"] => {
            let suggested = app.finalize_selection()?;
            let answer = read_line(&format!("Reference month [{}] (- to cancel): ", suggested))?;
            match answer.as_deref().map(str::trim) {
                None | Some("-") => app.cancel_month_prompt(),
                Some("") => {
                    app.confirm_month(&suggested)?;
                }
                Some(label) => {
                    app.confirm_month(label)?;
                }
            }
        }
        ["back"] => app.navigate(Screen::Home)?,
        _ => bail!("Unknown command"),
    }
    Ok(())
}

fn purchase_screen(app: &mut ShoppingApp, words: &[&str]) -> Result<()> {
    match words {
        ["buy", cat, item] => {
            let label = list_category(app, cat)?;
            app.toggle_purchased(&label, parse_index(item)?)?;
        }
        ["price", cat, item, value] => {
            let label = list_category(app, cat)?;
            app.set_price(&label, parse_index(item)?, value)?;
        }
        ["price", cat, item] => {
            let label = list_category(app, cat)?;
            app.set_price(&label, parse_index(item)?, "")?;
        }
        ["clear"] => {
            app.clear_list()?;
        }
        ["finish"] => {
            let total = app.finish_purchase();
            println!("Purchase finished! Total: R$ {:.2}", total);
        }
        ["back"] => app.navigate(Screen::Home)?,
        _ => bail!("Unknown command"),
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Text after the command word, untouched apart from trimming
fn rest_after<'a>(line: &'a str, command: &str) -> &'a str {
    line.trim_start()
        .strip_prefix(command)
        .unwrap_or("")
        .trim()
}

/// 1-based position typed by the user -> 0-based index
fn parse_index(raw: &str) -> Result<usize> {
    let raw = raw.rsplit('.').next().unwrap_or(raw);
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => bail!("Expected a position starting at 1, got '{}'", raw),
    }
}

fn template_category(app: &ShoppingApp, raw: &str) -> Result<String> {
    let index = parse_index(raw)?;
    app.state()
        .template
        .categories()
        .keys()
        .nth(index)
        .cloned()
        .ok_or_else(|| anyhow!("No category {}", raw))
}

fn list_category(app: &ShoppingApp, raw: &str) -> Result<String> {
    let index = parse_index(raw)?;
    app.state()
        .tracker
        .active()
        .and_then(|list| list.categories.keys().nth(index).cloned())
        .ok_or_else(|| anyhow!("No category {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("1").unwrap(), 0);
        assert_eq!(parse_index("3").unwrap(), 2);
        // "2.3" as printed next to items refers to item 3
        assert_eq!(parse_index("2.3").unwrap(), 2);
        assert!(parse_index("0").is_err());
        assert!(parse_index("x").is_err());
    }

    #[test]
    fn test_rest_after() {
        assert_eq!(rest_after("new  Produtos de Limpeza ", "new"), "Produtos de Limpeza");
        assert_eq!(rest_after("add", "add"), "");
    }
}
