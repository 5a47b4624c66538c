//! Lesson-report templates.
//!
//! The list is the built-in templates followed by the custom ones stored in
//! the record store. Built-ins cannot be changed. Placeholders are written
//! `{name}` and filled at render time; the built-ins use `{曲名}` (piece),
//! `{良かった点}` (what went well), `{次回の目標}` (next goal) and `{アドバイス}`
//! (advice).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::cache::{read_through, Dataset};
use crate::error::{Result, StudioError};
use crate::models::{ReportTemplate, TemplateRequest};
use crate::services::DataCache;
use crate::sheets::{delete_row_by_id, find_row, parse_cell, SheetBackend};

const SHEET_NAME: &str = "ReportTemplates";

const BUILT_IN: [(&str, &str); 10] = [
    (
        "順調に進んでいます",
        "本日のレッスンもお疲れ様でした！\n\n{曲名}、順調に進んでいます。特に{良かった点}が素晴らしかったです。\n\n次回も{次回の目標}を中心に練習してみてください。引き続きよろしくお願いいたします！",
    ),
    (
        "とても頑張りました",
        "本日のレッスンもお疲れ様でした！\n\n今日は{曲名}に集中して取り組みました。{良かった点}がとても良くなっていて、日々の練習の成果が出ていますね！\n\n次回のレッスンまでに{次回の目標}を意識して練習してみてください。",
    ),
    (
        "次回へ向けて",
        "本日のレッスンもお疲れ様でした！\n\n{曲名}、少し難しい箇所がありましたが、焦らずゆっくり進めていきましょう。{アドバイス}\n\n次回は{次回の目標}から始めますね。引き続きよろしくお願いいたします！",
    ),
    (
        "大きな成長が見られました",
        "本日のレッスンもお疲れ様でした！\n\n{曲名}の練習を通して、大きな成長が見られました！特に{良かった点}の上達が素晴らしいです。\n\nこの調子で、次は{次回の目標}にチャレンジしてみましょう。楽しみにしています！",
    ),
    (
        "丁寧に仕上げましょう",
        "本日のレッスンもお疲れ様でした！\n\n{曲名}、もう少しで仕上がりそうですね。{良かった点}が特に良くなってきました。\n\n仕上げとして{次回の目標}を意識して、丁寧に練習してみてください。",
    ),
    (
        "新しい曲に挑戦",
        "本日のレッスンもお疲れ様でした！\n\n今日から{曲名}に挑戦しましたね。初めての曲でしたが、{良かった点}が既にできていて素晴らしかったです。\n\n次回は{次回の目標}を中心に進めていきましょう！",
    ),
    (
        "リズム感が向上",
        "本日のレッスンもお疲れ様でした！\n\n{曲名}の練習で、リズム感がとても良くなってきましたね！{良かった点}も素晴らしかったです。\n\n次回は{次回の目標}に取り組んでいきましょう。引き続き頑張ってください！",
    ),
    (
        "表現力がアップ",
        "本日のレッスンもお疲れ様でした！\n\n{曲名}、表現力が格段にアップしていますね！{良かった点}の表現が特に印象的でした。\n\n次回は{次回の目標}を意識して、さらに深みのある演奏を目指しましょう。",
    ),
    (
        "基礎練習を重視",
        "本日のレッスンもお疲れ様でした！\n\n今日は基礎練習を中心に行いました。{良かった点}がしっかりできていて、着実に力がついています。\n\n次回は{曲名}を使って{次回の目標}を確認していきますね。",
    ),
    (
        "発表会に向けて",
        "本日のレッスンもお疲れ様でした！\n\n発表会で演奏する{曲名}の練習を進めています。{良かった点}が特に良く、本番が楽しみです！\n\n次回は{次回の目標}を中心に仕上げていきましょう。",
    ),
];

/// The built-in templates, with ids 1..=10.
pub fn default_templates() -> Vec<ReportTemplate> {
    BUILT_IN
        .iter()
        .zip(1..)
        .map(|((label, text), id)| ReportTemplate {
            id,
            label: label.to_string(),
            text: text.to_string(),
            is_custom: false,
        })
        .collect()
}

fn is_built_in(id: i64) -> bool {
    (1..=BUILT_IN.len() as i64).contains(&id)
}

/// Replaces each `{name}` with its value. Unknown placeholders and stray
/// braces are left as written.
pub fn render_text(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if !after[..end].contains('{') => {
                let name = &after[..end];
                match values.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Clone)]
pub struct TemplateService {
    backend: Arc<dyn SheetBackend>,
    cache: DataCache,
}

impl TemplateService {
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self { backend, cache }
    }

    /// Built-in then custom templates. When the store is unreachable only the
    /// built-ins are returned, and nothing is cached.
    pub async fn list(&self) -> Vec<ReportTemplate> {
        let dataset = Dataset::Templates;
        read_through(
            &self.cache.templates,
            dataset.key(),
            self.cache.ttl_ms(dataset),
            || self.fetch(),
        )
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to fetch report templates");
            default_templates()
        })
    }

    async fn fetch(&self) -> Result<Vec<ReportTemplate>> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        let mut templates = default_templates();
        templates.extend(rows.iter().map(|row| ReportTemplate::from_row(row)));
        Ok(templates)
    }

    /// Adds a custom template and returns its id.
    ///
    /// Ids are creation times in milliseconds, bumped past any existing id.
    pub async fn create(&self, request: &TemplateRequest) -> Result<i64> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        let newest = rows
            .iter()
            .filter_map(|row| parse_cell::<i64>(row, 0))
            .max()
            .unwrap_or(0);
        let now = i64::try_from(self.cache.now_ms()).unwrap_or(i64::MAX);
        let id = now.max(newest + 1);

        let template = ReportTemplate {
            id,
            label: request.label.clone(),
            text: request.text.clone(),
            is_custom: true,
        };
        self.backend.append_row(SHEET_NAME, template.to_row()).await?;
        self.cache.invalidate(Dataset::Templates).await;
        info!(id, label = %template.label, "report template created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, request: &TemplateRequest) -> Result<()> {
        ensure_custom(id)?;
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        let index = find_row(&rows, id)
            .ok_or_else(|| StudioError::NotFound(format!("template {}", id)))?;

        let template = ReportTemplate {
            id,
            label: request.label.clone(),
            text: request.text.clone(),
            is_custom: true,
        };
        self.backend.update_row(SHEET_NAME, index, template.to_row()).await?;
        self.cache.invalidate(Dataset::Templates).await;
        info!(id, "report template updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        ensure_custom(id)?;
        delete_row_by_id(self.backend.as_ref(), SHEET_NAME, id).await?;
        self.cache.invalidate(Dataset::Templates).await;
        info!(id, "report template deleted");
        Ok(())
    }

    /// Fills the placeholders of template `id`.
    pub async fn render(&self, id: i64, values: &HashMap<String, String>) -> Result<String> {
        let template = self
            .list()
            .await
            .into_iter()
            .find(|template| template.id == id)
            .ok_or_else(|| StudioError::NotFound(format!("template {}", id)))?;
        Ok(render_text(&template.text, values))
    }
}

fn ensure_custom(id: i64) -> Result<()> {
    if is_built_in(id) {
        Err(StudioError::ReadOnly(format!(
            "template {} is built in and cannot be changed",
            id
        )))
    } else {
        Ok(())
    }
}
