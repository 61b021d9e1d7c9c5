//! Ratio metrics and the loss rule.
//!
//! All percentages go through [`safe_pct`]: a zero denominator is replaced
//! by 1, the result is clamped to `[0, 100]` and rounded to two decimals.
//! Downstream rankings rely on the cap, so values above 100 are never
//! reported as anomalies.
use crate::types::{ClientSummary, Kpis, LossRow, OrderRecord, ProductSummary, SaleRecord};
use crate::util::round2;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_LOSS_THRESHOLD_PCT: f64 = 20.0;

pub fn safe_pct(numerator: f64, denominator: f64) -> f64 {
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    let pct = numerator / denominator * 100.0;
    // Also catches -0.0, which `clamp` would let through.
    if !pct.is_finite() || pct <= 0.0 {
        return 0.0;
    }
    round2(pct.clamp(0.0, 100.0))
}

/// Element-wise [`safe_pct`] over two series sharing one index.
pub fn pct_series(numerators: &[f64], denominators: &[f64]) -> Vec<f64> {
    numerators
        .iter()
        .zip(denominators)
        .map(|(n, d)| safe_pct(*n, *d))
        .collect()
}

/// A product is a loss when its return share is above the threshold and
/// something was actually returned.
pub fn is_loss(return_pct: f64, returned_amount: f64, threshold_pct: f64) -> bool {
    return_pct > threshold_pct && returned_amount > 0.0
}

/// Flagged products, worst return share first.
pub fn loss_products(
    products: &[ProductSummary],
    sales: &[SaleRecord],
    threshold_pct: f64,
) -> Vec<LossRow> {
    let mut cost: HashMap<&str, f64> = HashMap::new();
    for s in sales {
        *cost.entry(s.product.trim()).or_insert(0.0) += s.cost_amount;
    }
    let mut rows: Vec<LossRow> = products
        .iter()
        .filter(|p| is_loss(p.return_pct, p.returned_amount, threshold_pct))
        .map(|p| {
            let cost_amount = cost.get(p.product.as_str()).copied().unwrap_or(0.0);
            LossRow {
                product: p.product.clone(),
                sold_amount: p.sold_amount,
                returned_amount: p.returned_amount,
                cost_amount,
                return_pct: p.return_pct,
                margin: p.sold_amount - p.returned_amount - cost_amount,
            }
        })
        .collect();
    rows.sort_by(|a, b| by_pct_desc(a.return_pct, b.return_pct));
    rows
}

/// The "top offenders": highest return share first, ties keep key order.
pub fn top_clients(clients: &[ClientSummary], n: usize) -> Vec<ClientSummary> {
    let mut ranked = clients.to_vec();
    ranked.sort_by(|a, b| by_pct_desc(a.return_pct, b.return_pct));
    ranked.truncate(n);
    ranked
}

fn by_pct_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn kpis(orders: &[OrderRecord], sales: &[SaleRecord]) -> Kpis {
    // `Iterator::sum` over no floats gives -0.0; totals start from +0.0.
    let total_ordered_qty = orders.iter().fold(0.0, |acc, r| acc + r.quantity);
    let total_sold_qty = sales.iter().fold(0.0, |acc, r| acc + r.quantity);
    let total_sale_amount = sales.iter().fold(0.0, |acc, r| acc + r.sale_amount);
    let total_return_amount = sales.iter().fold(0.0, |acc, r| acc + r.return_amount);
    Kpis {
        total_ordered_qty,
        total_sold_qty,
        total_sale_amount,
        total_return_amount,
        return_pct: safe_pct(total_return_amount, total_sale_amount),
        fulfillment_pct: safe_pct(total_sold_qty, total_ordered_qty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, sold: f64, returned: f64) -> ProductSummary {
        ProductSummary {
            product: name.to_string(),
            ordered_qty: 0.0,
            sold_qty: 0.0,
            sold_amount: sold,
            returned_amount: returned,
            return_pct: safe_pct(returned, sold),
            fulfillment_pct: 0.0,
        }
    }

    fn client(name: &str, return_pct: f64) -> ClientSummary {
        ClientSummary {
            counterparty: name.to_string(),
            ordered_qty: 0.0,
            sold_amount: 0.0,
            returned_amount: 0.0,
            return_pct,
        }
    }

    #[test]
    fn zero_denominator_is_capped_not_exploded() {
        assert_eq!(safe_pct(150.0, 0.0), 100.0);
        assert_eq!(safe_pct(0.0, 0.0), 0.0);
        assert_eq!(safe_pct(0.5, 0.0), 50.0);
    }

    #[test]
    fn result_is_clamped_and_rounded() {
        assert_eq!(safe_pct(20.0, 100.0), 20.0);
        assert_eq!(safe_pct(1.0, 3.0), 33.33);
        assert_eq!(safe_pct(2.0, 3.0), 66.67);
        assert_eq!(safe_pct(500.0, 100.0), 100.0);
        assert_eq!(safe_pct(-5.0, 100.0), 0.0);
        assert_eq!(safe_pct(f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn pct_series_stays_in_bounds() {
        let nums = [0.0, 5.0, 150.0, 30.0, 1e9];
        let dens = [0.0, 0.0, 0.0, 60.0, 1.0];
        let out = pct_series(&nums, &dens);
        assert_eq!(out, vec![0.0, 100.0, 100.0, 50.0, 100.0]);
        assert!(out.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn loss_rule_requires_actual_returns() {
        let flagged = product("X", 0.0, 5.0);
        assert_eq!(flagged.return_pct, 100.0);
        assert!(is_loss(flagged.return_pct, flagged.returned_amount, 20.0));

        let quiet = product("Y", 0.0, 0.0);
        assert_eq!(quiet.return_pct, 0.0);
        assert!(!is_loss(quiet.return_pct, quiet.returned_amount, 20.0));

        assert!(!is_loss(20.0, 20.0, DEFAULT_LOSS_THRESHOLD_PCT));
        assert!(is_loss(20.01, 1.0, DEFAULT_LOSS_THRESHOLD_PCT));
    }

    #[test]
    fn loss_products_sorted_by_return_share() {
        let products = vec![
            product("A", 100.0, 30.0),
            product("B", 100.0, 10.0),
            product("C", 0.0, 5.0),
            product("D", 0.0, 0.0),
        ];
        let sales = vec![SaleRecord {
            quantity: 0.0,
            sale_amount: 100.0,
            return_amount: 30.0,
            return_quantity: 0.0,
            cost_amount: 60.0,
            counterparty: "x".to_string(),
            product: "A".to_string(),
            timestamp: None,
        }];
        let losses = loss_products(&products, &sales, DEFAULT_LOSS_THRESHOLD_PCT);
        let names: Vec<&str> = losses.iter().map(|l| l.product.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
        assert_eq!(losses[1].cost_amount, 60.0);
        assert_eq!(losses[1].margin, 10.0);
    }

    #[test]
    fn top_clients_is_stable_and_truncated() {
        let clients = vec![
            client("a", 10.0),
            client("b", 90.0),
            client("c", 10.0),
            client("d", 50.0),
        ];
        let top = top_clients(&clients, 3);
        let names: Vec<&str> = top.iter().map(|c| c.counterparty.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a"]);
    }

    #[test]
    fn empty_tables_give_positive_zero() {
        let k = kpis(&[], &[]);
        for v in [
            k.total_ordered_qty,
            k.total_sold_qty,
            k.total_sale_amount,
            k.total_return_amount,
            k.return_pct,
            k.fulfillment_pct,
        ] {
            assert_eq!(v, 0.0);
            assert!(v.is_sign_positive());
        }
        assert!(safe_pct(-0.0, 0.0).is_sign_positive());
        assert_eq!(serde_json::to_string(&k.return_pct).unwrap(), "0.0");
    }

    #[test]
    fn kpis_use_the_same_policy() {
        let sales = vec![SaleRecord {
            quantity: 3.0,
            sale_amount: 0.0,
            return_amount: 150.0,
            return_quantity: 0.0,
            cost_amount: 0.0,
            counterparty: "x".to_string(),
            product: "A".to_string(),
            timestamp: None,
        }];
        let k = kpis(&[], &sales);
        assert_eq!(k.total_ordered_qty, 0.0);
        assert_eq!(k.return_pct, 100.0);
        assert_eq!(k.fulfillment_pct, 100.0);
    }
}
