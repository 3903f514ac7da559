//! Chat assistant backed by a local LLM server (Ollama `/api/chat`)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{ChatMessage, ChatRole, PublicMenuItem};

use crate::config::LlmConfig;
use crate::db::BoxError;

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

impl LlmClient {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send the full conversation (system prompt first) and return the reply text
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, BoxError> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .json(&ChatCompletionRequest {
                model: &self.config.model,
                messages,
                stream: false,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("LLM request failed ({status}): {body}").into());
        }
        let reply: ChatCompletionResponse = resp.json().await?;
        let content = reply.message.content.trim().to_string();
        if content.is_empty() {
            return Err("LLM returned an empty reply".into());
        }
        Ok(content)
    }
}

/// What the assistant knows about the restaurant
pub struct PromptContext<'a> {
    pub restaurant_name: &'a str,
    pub currency: &'a str,
    /// Menu visible at the customer's table, when they are seated
    pub menu: Option<&'a [PublicMenuItem]>,
}

pub fn build_system_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = format!(
        "You are the friendly ordering assistant of {name}. Answer questions about the menu, \
         ingredients and dietary options briefly. You cannot place orders yourself; guide the \
         guest to add items to the cart. Only recommend dishes that appear on the menu below. \
         Prices are in {currency}.\n",
        name = ctx.restaurant_name,
        currency = ctx.currency,
    );

    match ctx.menu {
        Some(items) if !items.is_empty() => {
            prompt.push_str("\nMenu:\n");
            let mut current_category: Option<&str> = None;
            let mut sorted: Vec<&PublicMenuItem> = items.iter().collect();
            sorted.sort_by(|a, b| {
                a.category
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.category.as_deref().unwrap_or(""))
                    .then_with(|| a.name.cmp(&b.name))
            });
            for item in sorted {
                let category = item.category.as_deref().unwrap_or("Other");
                if current_category != Some(category) {
                    prompt.push_str(&format!("[{category}]\n"));
                    current_category = Some(category);
                }
                prompt.push_str(&menu_line(item));
            }
        }
        Some(_) => prompt.push_str("\nThe menu is currently empty.\n"),
        None => prompt.push_str(
            "\nThe guest has not scanned a table yet; suggest scanning the QR code on the table to see the menu.\n",
        ),
    }
    prompt
}

fn menu_line(item: &PublicMenuItem) -> String {
    let diet = if item.is_veg { "veg" } else { "non-veg" };
    let mut line = format!("- {} ({}): {}", item.name, diet, format_price(item.price));
    if let Some(desc) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
        line.push_str(" - ");
        line.push_str(desc.trim());
    }
    line.push('\n');
    line
}

fn format_price(price: Decimal) -> String {
    format!("{:.2}", price.round_dp(2))
}

/// System prompt followed by the guest's conversation
pub fn assemble(system_prompt: String, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(
        conversation
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned(),
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn item(name: &str, category: Option<&str>, price: Decimal, is_veg: bool) -> PublicMenuItem {
        PublicMenuItem {
            id: 1,
            name: name.into(),
            description: None,
            category: category.map(String::from),
            price,
            image_url: None,
            is_veg,
        }
    }

    #[test]
    fn test_prompt_lists_menu_by_category() {
        let menu = vec![
            item("Masala Dosa", Some("Mains"), Decimal::new(120, 0), true),
            item("Chicken 65", Some("Starters"), Decimal::new(2205, 1), false),
            item("Filter Coffee", None, Decimal::new(40, 0), true),
        ];
        let prompt = build_system_prompt(&PromptContext {
            restaurant_name: "Udupi Corner",
            currency: "INR",
            menu: Some(&menu),
        });
        assert!(prompt.contains("Udupi Corner"));
        assert!(prompt.contains("[Mains]\n- Masala Dosa (veg): 120.00"));
        assert!(prompt.contains("- Chicken 65 (non-veg): 220.50"));
        assert!(prompt.contains("[Other]\n- Filter Coffee"));
        let mains = prompt.find("[Mains]").unwrap();
        let starters = prompt.find("[Starters]").unwrap();
        assert!(mains < starters);
    }

    #[test]
    fn test_prompt_without_session() {
        let prompt = build_system_prompt(&PromptContext {
            restaurant_name: "Udupi Corner",
            currency: "INR",
            menu: None,
        });
        assert!(prompt.contains("scan"));
        assert!(!prompt.contains("Menu:"));
    }

    #[test]
    fn test_assemble_puts_system_first() {
        let conversation = vec![ChatMessage {
            role: ChatRole::User,
            content: "Anything gluten free?".into(),
        }];
        let messages = assemble("sys".into(), &conversation);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].content, "Anything gluten free?");
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("hi")];
        let body = serde_json::to_value(ChatCompletionRequest {
            model: "llama3.2",
            messages: &messages,
            stream: false,
        })
        .unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_unreachable_host_errors() {
        let client = LlmClient::new(reqwest::Client::new(), Config::for_tests().llm);
        assert!(client.chat(&[ChatMessage::system("hi")]).await.is_err());
    }
}
