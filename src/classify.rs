//! Weighted-keyword category classification with a spam short-circuit (C2).
//!
//! Grounded on `examples/original_source/ai/nlp.py` (`TypeClassifier`,
//! `_TYPE_KEYWORDS`, `_SPAM_PATTERNS`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Category;

const LOW_CONFIDENCE_THRESHOLD: i32 = 2;
const MIN_SPAM_TEXT_LEN: usize = 200;

static SPAM_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S{25,}").unwrap());

static SPAM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(тюльпан|срезка|питомник|вашутино)",
        r"(?i)(скидк|акци|распродаж).{0,30}(склад|цен|заказ|прайс)",
        r"(?i)(предлагаем|предлагает).{0,40}(оборудован|товар|продукц|услуг)",
        r"(?i)(дайджест|newsletter|digest|рассылк).{0,20}(digital|маркет)",
        r"(?i)поздравляем.{0,40}(день рождения|юбиле)",
        r"(?i)(приглашаем|приглашает).{0,40}(мероприяти|вебинар|конференц|день инвестора)",
        r"(?i)(минимальный заказ|упаковка|транспортировка|отгрузка).{0,60}(шт|руб|кг)",
        r"(?i)unsubscribe|отписаться от рассылки",
        r"(?i)(2gis|2гис).{0,30}(система|карт|появ)",
        r"(?i)(iqas|интеллектуальн).{0,20}(лига|quiz|квиз)",
        r"(?i)wunder\s*digital",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// `(substring, weight)` keyword table, one list per category, declaration
/// order doubling as the tie-break order (spec §4.2 step 3).
static TYPE_KEYWORDS: Lazy<Vec<(Category, Vec<(&'static str, i32)>)>> = Lazy::new(|| {
    vec![
        (
            Category::Complaint,
            vec![
                ("жалоба", 3), ("жалуюсь", 3), ("жалобу", 3),
                ("недоволен", 2), ("недовольна", 2), ("недовольны", 2),
                ("плохой сервис", 3), ("плохое обслуживание", 3),
                ("заблокировали", 3), ("заблокирован", 3), ("заблокированы", 3),
                ("не имеете права", 3), ("без причины", 2),
                ("возмутительно", 3), ("безобразие", 3), ("возмущен", 2),
                ("нарушаете", 2), ("нарушение прав", 3),
                ("это издевательство", 3), ("издевательство", 2),
                ("complaint", 3), ("шагым", 3),
            ],
        ),
        (
            Category::ChangeOfData,
            vec![
                ("смена", 2), ("смену", 2), ("сменить", 2),
                ("изменить", 2), ("изменение", 2), ("изменить данные", 3),
                ("обновить", 2), ("поменять", 2),
                ("данные", 1), ("реквизиты", 2),
                ("адрес", 1), ("телефон", 1), ("номер телефона", 2),
                ("новый номер", 3), ("сменила номер", 3), ("сменил номер", 3),
                ("ауыстырып", 3), ("жаңа нөмір", 3), ("нөмірімді", 3),
                ("нөміріне ауыстыр", 3),
                ("удостоверение", 2), ("уд.личности", 3), ("уд личности", 3),
                ("просрочен", 2), ("просроченный", 2), ("просрочено", 2),
                ("верификаци", 1), ("восстановить доступ", 2),
                ("изменились данные", 3), ("изменились мои данные", 3),
                ("обновить данные", 3),
                ("change data", 2), ("update", 1),
                ("деректерді өзгерту", 3), ("менің деректер", 2),
            ],
        ),
        (
            Category::Consultation,
            vec![
                ("вопрос", 2), ("как", 1), ("подскажите", 2),
                ("консультация", 3), ("помогите", 1), ("объясните", 2),
                ("уточните", 2), ("уточнить", 2),
                ("можно ли", 2), ("каким образом", 2),
                ("имеет ли право", 4),
                ("как можно", 2), ("как мне", 2),
                ("подскажи", 2), ("объясни", 2),
                ("помогите пожалуйста", 3),
                ("question", 2), ("help", 1), ("how to", 2), ("could you", 2),
                ("please tell", 2), ("please advise", 2),
                ("кеңес", 3), ("түсіндіріп", 3), ("көмектесіп", 3),
            ],
        ),
        (
            Category::Claim,
            vec![
                ("претензия", 3), ("претензию", 3),
                ("требую", 3), ("верните", 3), ("верните деньги", 3),
                ("возврат", 2), ("возвратите", 3),
                ("компенсация", 3), ("компенсацию", 3),
                ("нарушение", 2), ("нарушили", 2),
                ("в суд", 3), ("подам в суд", 3),
                ("правоохранительные органы", 3), ("полицию", 2),
                ("списали", 2), ("незаконно списали", 3),
                ("не пришло", 2), ("не зачислено", 2), ("не поступило", 2),
                ("не на моем счету", 3), ("не дошло", 2),
                ("аннулировать", 3), ("дублирующие списания", 3),
                ("официально заявляю", 3), ("официальный ответ", 2),
                ("afsa", 3), ("аррфр", 3), ("национальный банк", 2),
                ("claim", 3), ("талап", 3),
            ],
        ),
        (
            Category::AppFailure,
            vec![
                ("не работает", 3), ("не работают", 3),
                ("приложение", 2), ("не открывается", 3),
                ("ошибка", 2), ("выдает ошибку", 3), ("выдаёт ошибку", 3),
                ("баг", 3), ("зависает", 3), ("сбой", 3),
                ("не могу войти", 3), ("не удается войти", 3), ("не удаётся войти", 3),
                ("не могу зайти", 3), ("не пускает", 2),
                ("не приходит смс", 3), ("смс не приходит", 3),
                ("смс не приходят", 3), ("код не приходит", 3),
                ("пароль не принимает", 3), ("не принимает пароль", 3),
                ("не могу восстановить", 2), ("восстановление пароля", 2),
                ("войти не могу", 3), ("выкидывает", 3),
                ("не загружает", 3), ("не грузится", 3), ("сайт не открывается", 3),
                ("постоянно выкидывает", 3),
                ("app crash", 3), ("error", 2), ("something went wrong", 3),
                ("қолданба", 2), ("жұмыс істемейді", 3), ("ашылмай", 3),
                ("кірмеймін", 3),
            ],
        ),
        (
            Category::Fraud,
            vec![
                ("мошенник", 3), ("мошенники", 3),
                ("мошеннич", 3), ("мошенничество", 3),
                ("мошеннической", 3), ("мошенническая", 3),
                ("обман", 3), ("обманули", 3),
                ("украли", 3), ("украли деньги", 3),
                ("несанкционированный", 2), ("без моего ведома", 3),
                ("жертвой мошенников", 3), ("жертва мошенников", 3),
                ("подозрительн", 2), ("взлом", 3), ("взломали", 3),
                ("таргетированной рекламы", 2), ("от лица фридом", 3),
                ("представляются сотрудниками", 3),
                ("поддельный сертификат", 3), ("действительный сертификат", 2),
                ("fraud", 3), ("scam", 3), ("phishing", 3),
                ("hacked", 3), ("unauthorized", 3),
                ("алаяқтық", 3),
            ],
        ),
        (
            Category::Spam,
            vec![
                ("спам", 3), ("рассылка", 2), ("нежелательный", 2),
                ("реклама", 2), ("рекламная рассылка", 3),
                ("spam", 3), ("advertisement", 2), ("unwanted", 2),
                ("спам-хабар", 3),
            ],
        ),
    ]
});

/// Weighted-keyword category classifier with a spam short-circuit.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeClassifier;

impl TypeClassifier {
    pub fn new() -> Self {
        TypeClassifier
    }

    /// Classify `text`, returning the winning category only.
    pub fn classify(&self, text: &str) -> Category {
        self.classify_with_score(text).0
    }

    /// Classify `text`, also returning the winning category's raw score —
    /// useful for routing low-confidence texts to an external enricher.
    pub fn classify_with_score(&self, text: &str) -> (Category, i32) {
        if is_spam(text) {
            return (Category::Spam, 99);
        }

        let lowered = text.to_lowercase();
        let mut best: Option<(Category, i32)> = None;
        for (category, keywords) in TYPE_KEYWORDS.iter() {
            let score: i32 = keywords
                .iter()
                .filter(|(kw, _)| lowered.contains(kw))
                .map(|(_, w)| *w)
                .sum();
            // First category (declaration order) wins ties — only replace
            // the current best on a strictly higher score.
            if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((*category, score));
            }
        }

        let (best_category, best_score) = best.unwrap_or((Category::Consultation, 0));
        if best_score < LOW_CONFIDENCE_THRESHOLD {
            (Category::Consultation, best_score)
        } else {
            (best_category, best_score)
        }
    }
}

/// Spam short-circuit: a minimum-length (or long-URL) gate followed by a
/// closed list of marketing/newsletter patterns, or 3+ long URLs.
fn is_spam(text: &str) -> bool {
    if text.len() < MIN_SPAM_TEXT_LEN && !SPAM_URL_RE.is_match(text) {
        return false;
    }
    let url_count = SPAM_URL_RE.find_iter(text).count();
    if url_count >= 3 {
        return true;
    }
    SPAM_PATTERNS.iter().any(|p| p.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_defaults_to_consultation() {
        let c = TypeClassifier::new();
        assert_eq!(c.classify(""), Category::Consultation);
    }

    #[test]
    fn low_confidence_defaults_to_consultation() {
        let c = TypeClassifier::new();
        // No keyword hits at all.
        assert_eq!(c.classify("xyz qwe abc"), Category::Consultation);
    }

    #[test]
    fn fraud_keywords_win() {
        let c = TypeClassifier::new();
        let (cat, score) =
            c.classify_with_score("Мошенники украли деньги со счёта без моего ведома");
        assert_eq!(cat, Category::Fraud);
        assert!(score >= 2);
    }

    #[test]
    fn tie_break_prefers_earlier_declared_category() {
        let c = TypeClassifier::new();
        // "данные" (ChangeOfData, weight 1) appears once; craft a tie against
        // a later category with an equal score of 1 is hard with real
        // keywords, so instead verify declaration order directly: Complaint
        // is declared before ChangeOfData, before Consultation, etc.
        let order: Vec<Category> = TYPE_KEYWORDS.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                Category::Complaint,
                Category::ChangeOfData,
                Category::Consultation,
                Category::Claim,
                Category::AppFailure,
                Category::Fraud,
                Category::Spam,
            ]
        );
    }

    #[test]
    fn spam_short_circuits_regardless_of_other_keywords() {
        let c = TypeClassifier::new();
        let filler = "а ".repeat(120); // pad past the 200-char gate
        let body = format!(
            "{filler}Уважаемые клиенты, рекламная рассылка от нашей компании по акции на складе"
        );
        assert!(body.len() >= 200);
        assert_eq!(c.classify(&body), Category::Spam);
    }

    #[test]
    fn short_promotional_message_is_not_spam() {
        // Below the 200-char minimum-length gate and no long URL — the spam
        // gate intentionally does not fire (spec §9 open question).
        let c = TypeClassifier::new();
        assert_ne!(c.classify("рекламная рассылка"), Category::Spam);
    }

    #[test]
    fn three_long_urls_force_spam() {
        let c = TypeClassifier::new();
        let url = "https://example.com/".to_string() + &"a".repeat(20);
        let body = format!("{url} {url} {url}");
        assert_eq!(c.classify(&body), Category::Spam);
    }

    #[test]
    fn change_of_data_classification() {
        let c = TypeClassifier::new();
        assert_eq!(
            c.classify("Хочу сменить номер телефона, новый номер уже готов"),
            Category::ChangeOfData
        );
    }
}
