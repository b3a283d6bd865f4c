use api_types::{
    expense::ExpenseListResponse,
    friend::FriendsResponse,
    settlement::{CounterpartyBalanceView, SettlementsResponse},
    stats::CategoryTotalsResponse,
};
use chrono_tz::Europe::Rome;
use engine::{Currency, Money};
use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use uuid::Uuid;

/// Settle buttons rendered under the balance view; the rest of the list
/// stays textual to keep the keyboard usable.
const MAX_SETTLE_BUTTONS: usize = 8;

fn display_name(balance: &CounterpartyBalanceView) -> String {
    balance
        .counterparty_name
        .clone()
        .unwrap_or_else(|| balance.counterparty_id.to_string())
}

pub(crate) fn welcome_text() -> String {
    "👋 Benvenuto!\n\nInvia un messaggio tipo \"@bob 12.50 pranzo\" per registrare una spesa \
     pagata per un amico, oppure descrivi la spesa a parole e ci penso io.\n\
     Con /saldo vedi chi deve cosa."
        .to_string()
}

pub(crate) fn help_text() -> String {
    "Comandi disponibili:\n\
     /saldo — saldi aperti con gli amici\n\
     /storico — spese saldate\n\
     /stats — totali per categoria\n\
     /amici — i tuoi amici\n\
     /export — esporta lo storico in CSV\n\
     /aiuto — questo messaggio\n\n\
     Per registrare una spesa: \"@bob 12.50 pranzo #food\", oppure descrivila a parole."
        .to_string()
}

pub(crate) fn welcome_keyboard(miniapp_url: Option<&Url>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    if let Some(url) = miniapp_url {
        rows.push(vec![InlineKeyboardButton::web_app(
            "Apri la Mini App",
            WebAppInfo { url: url.clone() },
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "💰 Saldi",
        "nav:saldo",
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn render_saldo(
    currency: Currency,
    settlements: &SettlementsResponse,
) -> (String, InlineKeyboardMarkup) {
    let mut text = String::new();

    if settlements.owed_to_user.is_empty() && settlements.user_owes.is_empty() {
        text.push_str("Tutto saldato, nessun debito aperto. 🎉");
    }

    if !settlements.owed_to_user.is_empty() {
        text.push_str("Ti devono:\n");
        for balance in &settlements.owed_to_user {
            text.push_str(&format!(
                "  • {}: {} ({} voci)\n",
                display_name(balance),
                Money::new(balance.net_minor).format(currency),
                balance.lines.len(),
            ));
        }
    }

    if !settlements.user_owes.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("Devi:\n");
        for balance in &settlements.user_owes {
            text.push_str(&format!(
                "  • {}: {} ({} voci)\n",
                display_name(balance),
                Money::new(-balance.net_minor).format(currency),
                balance.lines.len(),
            ));
        }
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    'balances: for balance in &settlements.user_owes {
        let name = display_name(balance);
        for line in &balance.lines {
            if rows.len() >= MAX_SETTLE_BUTTONS {
                break 'balances;
            }
            // Lines where the user is the creditor net against the debt but
            // are not individually payable.
            if line.amount_minor >= 0 {
                continue;
            }
            let label = line.label.as_deref().unwrap_or("spesa");
            rows.push(vec![InlineKeyboardButton::callback(
                format!(
                    "Salda {name} • {label} • {}",
                    Money::new(-line.amount_minor).format(currency)
                ),
                format!("settle:{}", line.obligation_id),
            )]);
        }
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "🔄 Aggiorna",
        "nav:saldo",
    )]);

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn settle_confirm_keyboard(
    obligation_id: Uuid,
    can_pay: bool,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    if can_pay {
        rows.push(vec![InlineKeyboardButton::callback(
            "💸 Paga con Crypto Pay",
            format!("pay:{obligation_id}"),
        )]);
    }
    rows.push(vec![
        InlineKeyboardButton::callback("✅ Segna come pagato", format!("settle:ok:{obligation_id}")),
        InlineKeyboardButton::callback("⬅️ Annulla", "nav:saldo"),
    ]);
    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn pay_keyboard(pay_url: Url, obligation_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::url("💸 Paga la fattura", pay_url)],
        vec![InlineKeyboardButton::callback(
            "✅ Ho pagato",
            format!("settle:ok:{obligation_id}"),
        )],
    ])
}

pub(crate) fn render_stats(currency: Currency, stats: &CategoryTotalsResponse) -> String {
    if stats.totals.is_empty() {
        return "Nessuna spesa registrata.".to_string();
    }

    let mut entries: Vec<(&String, &i64)> = stats.totals.iter().collect();
    entries.sort_by_key(|(_, total)| std::cmp::Reverse(**total));

    let mut text = String::from("Totali per categoria:\n");
    for (category, total) in entries {
        text.push_str(&format!(
            "  • {category}: {}\n",
            Money::new(*total).format(currency)
        ));
    }
    text
}

pub(crate) fn render_storico(currency: Currency, list: &ExpenseListResponse) -> String {
    if list.expenses.is_empty() {
        return "Nessuna spesa saldata.".to_string();
    }

    let mut text = String::from("Spese saldate:\n");
    for (idx, expense) in list.expenses.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} • {}{}",
            idx + 1,
            expense.created_at.with_timezone(&Rome).format("%d/%m/%Y"),
            Money::new(expense.total_minor).format(currency),
            expense
                .description
                .as_deref()
                .map(|d| format!(" • {d}"))
                .unwrap_or_default(),
        ));
    }
    text
}

pub(crate) fn render_amici(friends: &FriendsResponse) -> String {
    if friends.friends.is_empty() {
        return "Nessun amico ancora. Aggiungili dalla Mini App.".to_string();
    }

    let mut text = String::from("I tuoi amici:\n");
    for friend in &friends.friends {
        text.push_str(&format!("  • {}\n", friend.nickname));
    }
    text
}
