//! Income and expenditure statement: bank movements grouped by (type, category)

use rust_decimal::Decimal;
use serde::Serialize;

use super::{category_label, CategoryTotals, ReportLine};
use crate::models::TransactionType;
use crate::types::DateRange;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IncomeExpenditure {
    pub period: DateRange,
    pub income: Vec<ReportLine>,
    pub expenditure: Vec<ReportLine>,
    pub total_income: Decimal,
    pub total_expenditure: Decimal,
    /// `total_income - total_expenditure`
    pub net: Decimal,
}

pub fn build(period: DateRange, totals: &CategoryTotals) -> IncomeExpenditure {
    let lines_for = |kind: TransactionType| {
        let mut lines: Vec<ReportLine> = Vec::new();
        for t in totals.iter().filter(|t| t.transaction_type == kind) {
            match lines.iter_mut().find(|l| l.category == t.category) {
                Some(line) => line.amount += t.amount,
                None => lines.push(ReportLine {
                    category: t.category.clone(),
                    label: category_label(&t.category),
                    amount: t.amount,
                }),
            }
        }
        lines.sort_by(|a, b| a.category.cmp(&b.category));
        lines
    };

    let income = lines_for(TransactionType::Credit);
    let expenditure = lines_for(TransactionType::Debit);
    let total_income: Decimal = income.iter().map(|l| l.amount).sum();
    let total_expenditure: Decimal = expenditure.iter().map(|l| l.amount).sum();

    IncomeExpenditure {
        period,
        income,
        expenditure,
        total_income,
        total_expenditure,
        net: total_income - total_expenditure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryTotal;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_groups_and_labels() {
        let period = DateRange::month(2024, 3).unwrap();
        let totals: CategoryTotals = vec![
            CategoryTotal { transaction_type: TransactionType::Credit, category: "sale".into(), amount: dec!(500) },
            CategoryTotal { transaction_type: TransactionType::Credit, category: "sale".into(), amount: dec!(100) },
            CategoryTotal { transaction_type: TransactionType::Debit, category: "shop_rent".into(), amount: dec!(250) },
            CategoryTotal { transaction_type: TransactionType::Debit, category: "expense".into(), amount: dec!(50) },
        ]
        .into_iter()
        .collect();

        let report = build(period, &totals);

        assert_eq!(report.period.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(report.income.len(), 1);
        assert_eq!(report.income[0].label, "Sales");
        assert_eq!(report.income[0].amount, dec!(600));
        assert_eq!(report.expenditure[0].label, "Expenses");
        assert_eq!(report.expenditure[1].label, "Shop Rent");
        assert_eq!(report.net, dec!(300));
    }

    #[test]
    fn test_empty_period() {
        let report = build(DateRange::month(2024, 1).unwrap(), &CategoryTotals::default());
        assert!(report.income.is_empty());
        assert_eq!(report.net, Decimal::ZERO);
    }
}
