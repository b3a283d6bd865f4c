use api_types::expense::{ExpenseNew, ParticipantNew, SourceKind};
use api_types::friend::FriendView;
use api_types::user::UserView;
use engine::Money;
use reqwest::Url;
use serde::Serialize;
use teloxide::{
    prelude::*,
    types::{ChatId, InputFile, User},
};
use uuid::Uuid;

use crate::{
    ConfigParameters,
    api::ApiError,
    parsing::parse_quick_split,
    ui,
};

enum Command {
    Start { code: Option<String> },
    Saldo,
    Storico,
    Stats,
    Amici,
    Export,
    Help,
}

fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.trim().split_whitespace();
    let head = parts.next()?;
    // Commands may arrive as "/saldo@BotName" in groups.
    let cmd = head.split('@').next().unwrap_or(head);

    match cmd {
        "/start" => Some(Command::Start {
            code: parts.next().map(str::to_string),
        }),
        "/saldo" => Some(Command::Saldo),
        "/storico" => Some(Command::Storico),
        "/stats" => Some(Command::Stats),
        "/amici" => Some(Command::Amici),
        "/export" => Some(Command::Export),
        "/aiuto" | "/help" => Some(Command::Help),
        _ if cmd.starts_with('/') => Some(Command::Help),
        _ => None,
    }
}

fn is_allowed(cfg: &ConfigParameters, user: Option<&User>) -> bool {
    match (&cfg.allowed_users, user) {
        (Some(allowed), Some(user)) => allowed.contains(&user.id),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn user_message_for_api_error(err: ApiError) -> String {
    match err {
        ApiError::Network(err) => {
            tracing::warn!("api request failed: {err}");
            "Problemi di connessione con il server. Riprova più tardi!".to_string()
        }
        ApiError::Server { status, message } => {
            tracing::debug!("server replied {status}: {message}");
            format!("Errore: {message}")
        }
    }
}

fn engine_currency(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Usd => engine::Currency::Usd,
    }
}

/// Resolves a name coming from the parser or from a quick-split message.
///
/// "tu"/"io"/"me"/"you" mean the sender; everything else is matched
/// case-insensitively against the sender's friend nicknames.
fn resolve_name(name: &str, me: &UserView, friends: &[FriendView]) -> Option<Uuid> {
    let normalized = name.trim().to_lowercase();
    if matches!(normalized.as_str(), "tu" | "io" | "me" | "you") {
        return Some(me.id);
    }
    friends
        .iter()
        .find(|friend| friend.nickname.to_lowercase() == normalized)
        .map(|friend| friend.friend_user_id)
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }

    let Some(from) = msg.from.as_ref() else {
        bot.send_message(msg.chat.id, "Impossibile identificare l'utente.")
            .await?;
        return Ok(());
    };
    let user_id = from.id.0;
    let chat_id = msg.chat.id;

    let Some(text) = msg.text() else {
        bot.send_message(
            chat_id,
            "Invia un messaggio di testo per registrare una spesa.",
        )
        .await?;
        return Ok(());
    };

    if let Some(cmd) = parse_command(text) {
        match cmd {
            Command::Start { code } => {
                if let Some(code) = code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                    if let Err(err) = cfg.api.pair_user(user_id, code).await {
                        bot.send_message(chat_id, user_message_for_api_error(err))
                            .await?;
                        return Ok(());
                    }
                    bot.send_message(chat_id, "Account associato! 🎉").await?;
                }
                bot.send_message(chat_id, ui::welcome_text())
                    .reply_markup(ui::welcome_keyboard(cfg.miniapp_url.as_ref()))
                    .await?;
            }
            Command::Saldo => show_saldo(&bot, chat_id, user_id, &cfg).await?,
            Command::Storico => {
                match cfg.api.settled_expenses(user_id, 10, None).await {
                    Ok(list) => {
                        let currency = engine_currency(
                            list.expenses
                                .first()
                                .map(|e| e.currency)
                                .unwrap_or_default(),
                        );
                        bot.send_message(chat_id, ui::render_storico(currency, &list))
                            .await?;
                    }
                    Err(err) => {
                        bot.send_message(chat_id, user_message_for_api_error(err))
                            .await?;
                    }
                }
            }
            Command::Stats => match cfg.api.category_totals(user_id).await {
                Ok(stats) => {
                    let currency = engine_currency(stats.currency);
                    bot.send_message(chat_id, ui::render_stats(currency, &stats))
                        .await?;
                }
                Err(err) => {
                    bot.send_message(chat_id, user_message_for_api_error(err))
                        .await?;
                }
            },
            Command::Amici => match cfg.api.friends(user_id).await {
                Ok(friends) => {
                    bot.send_message(chat_id, ui::render_amici(&friends)).await?;
                }
                Err(err) => {
                    bot.send_message(chat_id, user_message_for_api_error(err))
                        .await?;
                }
            },
            Command::Export => handle_export(&bot, chat_id, user_id, &cfg).await?,
            Command::Help => {
                bot.send_message(chat_id, ui::help_text()).await?;
            }
        }
        return Ok(());
    }

    if text.trim_start().starts_with('@') {
        handle_quick_split(&bot, chat_id, user_id, &cfg, text).await
    } else {
        handle_parsed_text(&bot, chat_id, user_id, &cfg, text).await
    }
}

async fn show_saldo(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
) -> ResponseResult<()> {
    match cfg.api.settlements(user_id).await {
        Ok(settlements) => {
            let currency = engine_currency(settlements.currency);
            let (text, kb) = ui::render_saldo(currency, &settlements);
            bot.send_message(chat_id, text).reply_markup(kb).await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
        }
    }
    Ok(())
}

async fn handle_quick_split(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    text: &str,
) -> ResponseResult<()> {
    let split = match parse_quick_split(text, engine::Currency::Usd) {
        Ok(split) => split,
        Err(err) => {
            bot.send_message(chat_id, format!("Non ho capito: {err}."))
                .await?;
            return Ok(());
        }
    };

    let me = match cfg.api.me(user_id).await {
        Ok(me) => me,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let friends = match cfg.api.friends(user_id).await {
        Ok(friends) => friends.friends,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };

    let Some(payee_id) = resolve_name(&split.nickname, &me, &friends) else {
        bot.send_message(
            chat_id,
            format!("Nessun amico chiamato \"{}\".", split.nickname),
        )
        .await?;
        return Ok(());
    };
    if payee_id == me.id {
        bot.send_message(chat_id, "Non puoi registrare un debito verso te stesso.")
            .await?;
        return Ok(());
    }

    let payload = ExpenseNew {
        description: split.note.clone(),
        source_kind: SourceKind::Text,
        source_path: None,
        total_minor: split.amount_minor,
        currency: None,
        participants: vec![ParticipantNew {
            payer_id: me.id,
            payee_id,
            amount_minor: split.amount_minor,
            label: split.note.clone(),
            category: split.category.clone(),
        }],
    };

    match cfg.api.record_expense(user_id, &payload).await {
        Ok(_) => {
            let amount = Money::new(split.amount_minor).format(engine::Currency::Usd);
            bot.send_message(
                chat_id,
                format!("✅ Registrato: hai pagato {amount} per {}.", split.nickname),
            )
            .await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
        }
    }
    Ok(())
}

async fn handle_parsed_text(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    text: &str,
) -> ResponseResult<()> {
    let Some(parser) = &cfg.parser else {
        bot.send_message(
            chat_id,
            "Non ho capito. Usa \"@amico importo nota\" oppure /aiuto.",
        )
        .await?;
        return Ok(());
    };

    let me = match cfg.api.me(user_id).await {
        Ok(me) => me,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let friends = match cfg.api.friends(user_id).await {
        Ok(friends) => friends.friends,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };

    let mut possible_friends: Vec<String> = vec!["Tu".to_string()];
    possible_friends.extend(friends.iter().map(|f| f.nickname.clone()));

    let parsed = match parser.parse_text(text, &possible_friends).await {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("parser request failed: {err}");
            bot.send_message(chat_id, "Il servizio di analisi non risponde. Riprova più tardi.")
                .await?;
            return Ok(());
        }
    };

    if parsed.transactions.is_empty() {
        bot.send_message(chat_id, "Nessuna transazione trovata nel messaggio.")
            .await?;
        return Ok(());
    }

    let mut recorded = 0usize;
    for split in &parsed.transactions {
        let Some(payer_id) = resolve_name(&split.from_friend, &me, &friends) else {
            bot.send_message(
                chat_id,
                format!("Non riconosco \"{}\".", split.from_friend),
            )
            .await?;
            continue;
        };
        let Some(payee_id) = resolve_name(&split.to_friend, &me, &friends) else {
            bot.send_message(chat_id, format!("Non riconosco \"{}\".", split.to_friend))
                .await?;
            continue;
        };
        if payer_id == payee_id {
            continue;
        }

        let amount_minor =
            match Money::parse_major(&split.amount, engine::Currency::Usd) {
                Ok(amount) if amount.is_positive() => amount.minor(),
                _ => {
                    bot.send_message(
                        chat_id,
                        format!("Importo non valido: \"{}\".", split.amount),
                    )
                    .await?;
                    continue;
                }
            };

        let payload = ExpenseNew {
            description: split.item.clone(),
            source_kind: SourceKind::Text,
            source_path: None,
            total_minor: amount_minor,
            currency: None,
            participants: vec![ParticipantNew {
                payer_id,
                payee_id,
                amount_minor,
                label: split.item.clone(),
                category: split.category.clone(),
            }],
        };

        match cfg.api.record_expense(user_id, &payload).await {
            Ok(_) => recorded += 1,
            Err(err) => {
                bot.send_message(chat_id, user_message_for_api_error(err))
                    .await?;
            }
        }
    }

    if recorded > 0 {
        bot.send_message(chat_id, format!("✅ Registrate {recorded} transazioni."))
            .await?;
    }
    Ok(())
}

async fn handle_export(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
) -> ResponseResult<()> {
    let list = match cfg.api.settled_expenses(user_id, 10_000, None).await {
        Ok(list) => list,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };

    #[derive(Serialize)]
    struct ExportRow {
        created_at: String,
        description: Option<String>,
        total_minor: i64,
        id: String,
    }

    let mut writer = csv::Writer::from_writer(vec![]);
    for expense in list.expenses {
        if let Err(err) = writer.serialize(ExportRow {
            created_at: expense.created_at.to_rfc3339(),
            description: expense.description,
            total_minor: expense.total_minor,
            id: expense.id.to_string(),
        }) {
            tracing::error!("failed to serialize export row: {err}");
            bot.send_message(chat_id, "Errore durante l'esportazione.")
                .await?;
            return Ok(());
        }
    }

    let data = match writer.into_inner() {
        Ok(data) => data,
        Err(err) => {
            tracing::error!("failed to finalize export: {err}");
            bot.send_message(chat_id, "Errore durante l'esportazione.")
                .await?;
            return Ok(());
        }
    };

    bot.send_document(chat_id, InputFile::memory(data).file_name("storico.csv"))
        .await?;

    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, Some(&q.from)) {
        return Ok(());
    }

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let user_id = q.from.id.0;
    let settler_name = q.from.first_name.clone();

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    if data == "nav:saldo" {
        show_saldo(&bot, chat_id, user_id, &cfg).await?;
    } else if let Some(raw) = data.strip_prefix("settle:ok:") {
        let Ok(obligation_id) = Uuid::parse_str(raw) else {
            return Ok(());
        };
        do_settle(&bot, chat_id, user_id, &cfg, obligation_id, &settler_name).await?;
    } else if let Some(raw) = data.strip_prefix("settle:") {
        let Ok(obligation_id) = Uuid::parse_str(raw) else {
            return Ok(());
        };
        bot.send_message(chat_id, "Confermi di aver saldato questa voce?")
            .reply_markup(ui::settle_confirm_keyboard(obligation_id, cfg.pay.is_some()))
            .await?;
    } else if let Some(raw) = data.strip_prefix("pay:") {
        let Ok(obligation_id) = Uuid::parse_str(raw) else {
            return Ok(());
        };
        send_invoice_link(&bot, chat_id, user_id, &cfg, obligation_id).await?;
    }

    Ok(())
}

async fn do_settle(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    obligation_id: Uuid,
    settler_name: &str,
) -> ResponseResult<()> {
    let settled = match cfg.api.settle(user_id, obligation_id).await {
        Ok(settled) => settled,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };

    let currency = engine_currency(settled.obligation.currency);
    let amount = Money::new(settled.obligation.amount_minor).format(currency);
    bot.send_message(chat_id, format!("✅ Segnato come pagato: {amount}."))
        .await?;

    // Forward the collected amount to the counterparty when the gateway is
    // configured. The obligation id doubles as spend id, so a replayed
    // callback cannot pay twice.
    if let (Some(pay), Some(telegram_id)) = (&cfg.pay, settled.counterparty_telegram_id.as_deref())
        && let Ok(recipient) = telegram_id.parse::<u64>()
    {
        match pay
            .transfer(
                recipient,
                settled.obligation.amount_minor,
                &settled.obligation.id.to_string(),
                Some("Saldo debito"),
            )
            .await
        {
            Ok(transfer) => tracing::info!("crypto transfer {} sent", transfer.transfer_id),
            Err(err) => tracing::warn!("crypto transfer failed: {err}"),
        }
    }

    // Fire-and-forget: a failed notification never rolls back a settle.
    if let Some(telegram_id) = settled.counterparty_telegram_id.as_deref()
        && let Ok(recipient) = telegram_id.parse::<i64>()
    {
        let note = format!("💸 {settler_name} ha saldato un debito di {amount}.");
        if let Err(err) = bot.send_message(ChatId(recipient), note).await {
            tracing::warn!("failed to notify counterparty: {err}");
        }
    }

    show_saldo(bot, chat_id, user_id, cfg).await
}

async fn send_invoice_link(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    obligation_id: Uuid,
) -> ResponseResult<()> {
    let Some(pay) = &cfg.pay else {
        bot.send_message(chat_id, "Pagamenti non configurati.").await?;
        return Ok(());
    };

    let obligations = match cfg.api.pending_obligations(user_id).await {
        Ok(list) => list,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let Some(obligation) = obligations
        .obligations
        .iter()
        .find(|o| o.id == obligation_id)
    else {
        bot.send_message(chat_id, "Voce non trovata o già saldata.")
            .await?;
        return Ok(());
    };

    let description = obligation.label.clone().unwrap_or_else(|| "Saldo debito".to_string());
    let invoice = match pay
        .create_invoice(
            obligation.amount_minor,
            Some(&description),
            Some(&obligation_id.to_string()),
        )
        .await
    {
        Ok(invoice) => invoice,
        Err(err) => {
            tracing::warn!("invoice creation failed: {err}");
            bot.send_message(chat_id, "Impossibile creare la fattura. Riprova più tardi.")
                .await?;
            return Ok(());
        }
    };

    match Url::parse(&invoice.pay_url) {
        Ok(pay_url) => {
            bot.send_message(
                chat_id,
                format!("Fattura #{} creata: paga e poi conferma.", invoice.invoice_id),
            )
            .reply_markup(ui::pay_keyboard(pay_url, obligation_id))
            .await?;
        }
        Err(err) => {
            tracing::warn!("invalid pay url from gateway: {err}");
            bot.send_message(chat_id, format!("Paga qui: {}", invoice.pay_url))
                .await?;
        }
    }

    Ok(())
}
