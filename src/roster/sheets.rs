//! Google-Sheets-backed roster fetcher
//!
//! Reads the whole sheet through the spreadsheet values API. The first row
//! is the header row; every following row becomes a header->cell record.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{RosterFetcher, RosterRow};
use crate::error::BotError;

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Fetches roster rows from a spreadsheet values endpoint
pub struct SheetsFetcher {
    client: reqwest::Client,
    spreadsheet_id: String,
    sheet_name: String,
    api_key: String,
}

impl SheetsFetcher {
    pub fn new(spreadsheet_id: String, sheet_name: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            spreadsheet_id,
            sheet_name,
            api_key,
        }
    }

    fn values_url(&self) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            self.spreadsheet_id, self.sheet_name
        )
    }

    /// Zip the header row with each data row into typed roster rows
    fn rows_from_values(values: Vec<Vec<String>>) -> Vec<RosterRow> {
        let mut iter = values.into_iter();
        let Some(headers) = iter.next() else {
            return Vec::new();
        };

        iter.map(|cells| {
            let record: HashMap<String, String> = headers
                .iter()
                .zip(cells)
                .map(|(header, cell)| (header.clone(), cell))
                .collect();
            RosterRow::from_record(&record)
        })
        .collect()
    }
}

#[async_trait]
impl RosterFetcher for SheetsFetcher {
    async fn fetch_rows(&self) -> Result<Vec<RosterRow>, BotError> {
        let response = self
            .client
            .get(self.values_url())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| BotError::External(format!("Sheet fetch failed: {}", e)))?
            .error_for_status()
            .map_err(|e| BotError::External(format!("Sheet fetch failed: {}", e)))?;

        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|e| BotError::External(format!("Sheet response invalid: {}", e)))?;

        Ok(Self::rows_from_values(body.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::columns;

    #[test]
    fn test_rows_from_values_zips_headers() {
        let values = vec![
            vec![
                columns::FULL_NAME.to_string(),
                columns::NATIONAL_KEY.to_string(),
                columns::SECTION.to_string(),
            ],
            vec![
                "Ana Anić".to_string(),
                "111".to_string(),
                "Foto".to_string(),
            ],
            // Short row: trailing cells simply absent
            vec!["Ivo Ivić".to_string(), "222".to_string()],
        ];

        let rows = SheetsFetcher::rows_from_values(values);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].full_name, "Ana Anić");
        assert_eq!(rows[0].section, "Foto");
        assert_eq!(rows[1].national_key, "222");
        assert_eq!(rows[1].section, "");
    }

    #[test]
    fn test_rows_from_values_empty_sheet() {
        assert!(SheetsFetcher::rows_from_values(Vec::new()).is_empty());
    }
}
