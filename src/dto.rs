use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Deposit,
    Withdraw,
    View,
    Update,
    Delete,
}

/// One input row of a batch file. Columns an operation does not use may be
/// left empty.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Operation {
    pub op: OperationType,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub pin: String,
    #[serde(default, deserialize_with = "deserialize_decimal_exact")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Operation {
    pub fn amount(&self) -> Result<Decimal, ValidationError> {
        self.amount.ok_or(ValidationError::MissingField("amount"))
    }
}

/// Parses the field text directly so amounts never pass through `f64`.
fn deserialize_decimal_exact<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| text.parse::<Decimal>().map_err(de::Error::custom))
        .transpose()
}

/// One output row per input row. `status` is `ok` or an error tag.
#[derive(Debug, Serialize, PartialEq)]
pub struct OutcomeRow {
    pub row: usize,
    pub op: OperationType,
    pub account: String,
    pub status: &'static str,
    pub balance: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse_csv_row(row: &str) -> Result<Operation, csv::Error> {
        let data_with_header = format!("op,account,pin,amount,name,email,phone\n{}", row);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data_with_header.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn test_parse_create() {
        assert_eq!(
            parse_csv_row("create,,0042,,Alice,a@x.com,9876543210").unwrap(),
            Operation {
                op: OperationType::Create,
                account: String::new(),
                pin: "0042".to_string(),
                amount: None,
                name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                phone: "9876543210".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_deposit() {
        let operation = parse_csv_row("deposit, ABCD1234 ,1234,100.25,,,").unwrap();
        assert_eq!(operation.op, OperationType::Deposit);
        assert_eq!(operation.account, "ABCD1234");
        assert_eq!(operation.amount(), Ok(dec!(100.25)));
    }

    #[test]
    fn test_parse_amount_keeps_full_precision() {
        let operation = parse_csv_row("deposit,ABCD1234,1234,1234567890.123456789,,,").unwrap();
        assert_eq!(operation.amount(), Ok(dec!(1234567890.123456789)));
        assert_eq!(operation.amount.unwrap().to_string(), "1234567890.123456789");
    }

    #[test]
    fn test_parse_amount_beyond_u64() {
        let operation = parse_csv_row("deposit,ABCD1234,1234,50000000000000000000000000000,,,").unwrap();
        assert_eq!(operation.amount(), Ok(dec!(50000000000000000000000000000)));
    }

    #[test]
    fn test_missing_amount() {
        let operation = parse_csv_row("withdraw,ABCD1234,1234,,,,").unwrap();
        assert_eq!(operation.amount(), Err(ValidationError::MissingField("amount")));
    }

    #[test]
    fn test_parse_invalid_amount_format() {
        assert!(parse_csv_row("deposit,ABCD1234,1234,abc,,,").is_err());
    }

    #[test]
    fn test_parse_invalid_operation_type() {
        assert!(parse_csv_row("transfer,ABCD1234,1234,1,,,").is_err());
    }

    #[test]
    fn test_write_outcome_row() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(OutcomeRow {
                row: 3,
                op: OperationType::Withdraw,
                account: "ABCD1234".to_string(),
                status: "insufficient_funds",
                balance: None,
            })
            .unwrap();
        writer
            .serialize(OutcomeRow {
                row: 4,
                op: OperationType::Deposit,
                account: "ABCD1234".to_string(),
                status: "ok",
                balance: Some(dec!(60)),
            })
            .unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            output,
            "row,op,account,status,balance\n3,withdraw,ABCD1234,insufficient_funds,\n4,deposit,ABCD1234,ok,60\n"
        );
    }
}
