#![allow(dead_code)]

use serde_json::{Value, json};

/// A JSON array of maane records in the production shape, with two
/// budgets each.
pub fn maane_records_json(count: usize) -> String {
    let records: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "שם_מענה": format!("מענה הדרכה {i}"),
                "קוד_מענה": format!("M-{i:03}"),
                "תקציבים_מהם_ניתן_לקנות_את_המענה": [
                    {"קוד_תקציב": 100 + i, "שם_תקציב": "סל תשתיות בית ספריות"},
                    {"קוד_תקציב": 200 + i, "שם_תקציב": "סל מנהיגות חינוכית"},
                ],
            })
        })
        .collect();
    serde_json::to_string_pretty(&records).unwrap()
}

pub fn user_budgets() -> Vec<String> {
    vec![
        "סל תשתיות בית ספריות".to_string(),
        "סל מנהיגות חינוכית".to_string(),
        "סל חינוך חברתי - קהילתי והעשרה".to_string(),
        "סל אוכלוסיות במיקוד".to_string(),
    ]
}
