//! Order Aggregate
//!
//! Folds report rows into one `SalesOrder` per Amazon order id.

use std::collections::HashMap;

use crate::config::ImportDefaults;
use crate::domain::value_objects::{amount_or_zero, format_amount, normalize_order_date, parse_amount, TaxCode};
use crate::{Address, Currency, Customer, Inventory, SalesOrder, SalesOrderItem, SalesTax, Udf};

/// Column names of the Amazon "All Orders" report.
pub mod columns {
    pub const ORDER_ID: &str = "amazon-order-id";
    pub const ITEM_STATUS: &str = "item-status";
    pub const FULFILLMENT_CHANNEL: &str = "fulfillment-channel";
    pub const SALES_CHANNEL: &str = "sales-channel";
    pub const ORDER_STATUS: &str = "order-status";
    pub const PURCHASE_DATE: &str = "purchase-date";
    pub const SHIP_CITY: &str = "ship-city";
    pub const SHIP_STATE: &str = "ship-state";
    pub const SHIP_POSTAL_CODE: &str = "ship-postal-code";
    pub const SHIP_COUNTRY: &str = "ship-country";
    pub const CURRENCY: &str = "currency";
    pub const SKU: &str = "sku";
    pub const QUANTITY: &str = "quantity";
    pub const ITEM_PRICE: &str = "item-price";
    pub const ITEM_TAX: &str = "item-tax";
    pub const SHIPPING_PRICE: &str = "shipping-price";
    pub const SHIP_PROMOTION_DISCOUNT: &str = "ship-promotion-discount";
}

use columns::*;

pub const ORDER_TYPE: &str = "O";
pub const ORDER_STATUS_OPEN: &str = "O";

/// One row of the report, keyed by column name. Empty cells are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderLine(HashMap<String, String>);

impl OrderLine {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, column: &str) -> Option<&str> { self.0.get(column).map(String::as_str) }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn order_id(&self) -> &str { self.get(ORDER_ID).unwrap_or_default() }

    pub fn is_cancelled(&self) -> bool { self.get(ITEM_STATUS) == Some("Cancelled") }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderLine {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Non-cancelled rows of one Amazon order, in report order.
#[derive(Clone, Debug)]
pub struct OrderGroup<'a> {
    order_id: &'a str,
    lines: Vec<&'a OrderLine>,
}

impl<'a> OrderGroup<'a> {
    /// Groups rows by order id, keeping first-seen order of groups and rows.
    /// Cancelled rows are dropped; groups left empty are not returned.
    pub fn collect(records: &'a [OrderLine]) -> Vec<Self> {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut groups: Vec<(&'a str, Vec<&'a OrderLine>)> = Vec::new();
        for record in records {
            let slot = *index.entry(record.order_id()).or_insert_with(|| {
                groups.push((record.order_id(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(record);
        }
        groups
            .into_iter()
            .filter_map(|(order_id, rows)| {
                let lines: Vec<_> = rows.into_iter().filter(|r| !r.is_cancelled()).collect();
                (!lines.is_empty()).then_some(Self { order_id, lines })
            })
            .collect()
    }

    pub fn order_id(&self) -> &str { self.order_id }
    pub fn lines(&self) -> &[&'a OrderLine] { &self.lines }

    /// Row supplying the order-level fields.
    pub fn head(&self) -> &'a OrderLine { self.lines[0] }

    /// Whether the order should be imported at all, judged on the head row.
    pub fn is_importable(&self) -> bool {
        let head = self.head();
        // Line status is checked against "Cancelled" but order status against
        // "cancelled"; the report has been seen with both spellings, so this
        // may let some cancelled orders through. Kept until confirmed.
        head.get(FULFILLMENT_CHANNEL) != Some("Merchant")
            && head.get(ORDER_STATUS) != Some("cancelled")
            && head.get(SALES_CHANNEL) != Some("Non-Amazon")
    }

    pub fn is_shipped(&self) -> bool { self.head().get(ORDER_STATUS) == Some("Shipped") }

    /// Sum of shipping price net of shipping promotions over all lines.
    pub fn freight(&self) -> f64 {
        self.lines
            .iter()
            .map(|r| amount_or_zero(r.get(SHIPPING_PRICE)) - amount_or_zero(r.get(SHIP_PROMOTION_DISCOUNT)))
            .sum()
    }
}

/// Builds `SalesOrder`s from report rows.
#[derive(Clone, Debug, Default)]
pub struct OrderAggregator {
    defaults: ImportDefaults,
}

impl OrderAggregator {
    pub fn new(defaults: ImportDefaults) -> Self { Self { defaults } }

    /// Returns one order per importable Amazon order id, in report order.
    /// Ineligible orders are skipped without logging.
    pub fn build(&self, records: &[OrderLine]) -> Vec<SalesOrder> {
        OrderGroup::collect(records)
            .iter()
            .filter(|g| g.is_importable())
            .map(|g| self.sales_order(g))
            .collect()
    }

    fn sales_order(&self, group: &OrderGroup<'_>) -> SalesOrder {
        let head = group.head();
        let shipped = group.is_shipped();
        let tax_code = TaxCode::classify(head.get(ITEM_PRICE), head.get(ITEM_TAX));

        SalesOrder {
            order_date: normalize_order_date(head.get(PURCHASE_DATE)),
            order_type: ORDER_TYPE.to_string(),
            reference_no: group.order_id().to_string(),
            hold: !shipped,
            status: ORDER_STATUS_OPEN.to_string(),
            currency: head.get(CURRENCY).map(|code| Currency { code: code.to_string() }),
            shipping_address: Address {
                city: head.get(SHIP_CITY).map(str::to_string),
                prov_state: head.get(SHIP_STATE).map(str::to_string),
                postal_code: head.get(SHIP_POSTAL_CODE).map(str::to_string),
                country: head.get(SHIP_COUNTRY).map(str::to_string),
                sales_taxes: vec![SalesTax { code: tax_code.map(|c| c.value()) }],
            },
            items: group.lines().iter().map(|line| self.item(group.order_id(), line)).collect(),
            udf: Udf { shopid: group.order_id().to_string(), shipped },
            freight: format_amount(group.freight()),
            customer: Customer { customer_no: self.defaults.customer_no.clone() },
        }
    }

    fn item(&self, order_id: &str, line: &OrderLine) -> SalesOrderItem {
        let sku = line.get(SKU).unwrap_or_default().to_string();
        let quantity = line.get(QUANTITY).unwrap_or_default();

        let unit_price = match (line.get(ITEM_PRICE).and_then(parse_amount), parse_amount(quantity)) {
            (Some(price), Some(qty)) if qty != 0.0 => price / qty,
            (price, qty) => {
                tracing::warn!(order = order_id, sku = %sku, ?price, ?qty, "Cannot derive unit price, using 0.0");
                0.0
            }
        };

        SalesOrderItem {
            inventory: Inventory { part_no: sku.clone(), whse: self.defaults.warehouse.clone() },
            part_no: sku,
            order_qty: quantity.to_string(),
            unit_price: format_amount(unit_price),
            tax_flags: [true; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(pairs: &[(&str, &str)]) -> OrderLine {
        pairs.iter().copied().collect()
    }

    fn shipped_line(order_id: &str, sku: &str) -> OrderLine {
        line(&[
            (ORDER_ID, order_id),
            (ITEM_STATUS, "Shipped"),
            (FULFILLMENT_CHANNEL, "Amazon"),
            (SALES_CHANNEL, "Amazon.ca"),
            (ORDER_STATUS, "Shipped"),
            (PURCHASE_DATE, "2024-08-15 13:05:00"),
            (SHIP_CITY, "Toronto"),
            (SHIP_STATE, "ON"),
            (SHIP_POSTAL_CODE, "M5V 2T6"),
            (SHIP_COUNTRY, "CA"),
            (CURRENCY, "CAD"),
            (SKU, sku),
            (QUANTITY, "2"),
            (ITEM_PRICE, "20.00"),
            (ITEM_TAX, "2.60"),
            (SHIPPING_PRICE, "5.00"),
            (SHIP_PROMOTION_DISCOUNT, "1.00"),
        ])
    }

    fn with(mut l: OrderLine, column: &str, value: &str) -> OrderLine {
        l.insert(column, value);
        l
    }

    fn build(records: &[OrderLine]) -> Vec<SalesOrder> {
        OrderAggregator::default().build(records)
    }

    #[test]
    fn test_single_order_fields() {
        let orders = build(&[shipped_line("701-1", "WIDGET")]);
        assert_eq!(orders.len(), 1);
        let o = &orders[0];
        assert_eq!(o.order_date, "2024-08-15");
        assert_eq!(o.order_type, "O");
        assert_eq!(o.status, "O");
        assert_eq!(o.reference_no, "701-1");
        assert!(!o.hold);
        assert_eq!(o.currency, Some(Currency { code: "CAD".into() }));
        assert_eq!(o.shipping_address.city.as_deref(), Some("Toronto"));
        assert_eq!(o.shipping_address.prov_state.as_deref(), Some("ON"));
        assert_eq!(o.shipping_address.sales_taxes, vec![SalesTax { code: Some(3) }]);
        assert_eq!(o.udf, Udf { shopid: "701-1".into(), shipped: true });
        assert_eq!(o.freight, "4.0");
        assert_eq!(o.customer.customer_no, "AMAZON");

        let item = &o.items[0];
        assert_eq!(item.inventory, Inventory { part_no: "WIDGET".into(), whse: "AMZN".into() });
        assert_eq!(item.part_no, "WIDGET");
        assert_eq!(item.order_qty, "2");
        assert_eq!(item.unit_price, "10.0");
        assert_eq!(item.tax_flags, [true; 4]);
    }

    #[test]
    fn test_cancelled_line_dropped_from_order() {
        let records = [
            with(shipped_line("701-2", "A"), ITEM_STATUS, "Cancelled"),
            shipped_line("701-2", "B"),
        ];
        let orders = build(&records);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[0].items[0].part_no, "B");
        assert!(!orders[0].hold);
    }

    #[test]
    fn test_all_lines_cancelled_yields_nothing() {
        let records = [
            with(shipped_line("701-3", "A"), ITEM_STATUS, "Cancelled"),
            with(shipped_line("701-3", "B"), ITEM_STATUS, "Cancelled"),
        ];
        assert!(build(&records).is_empty());
    }

    #[test]
    fn test_merchant_fulfilled_head_skips_order() {
        let records = [
            with(shipped_line("701-4", "A"), FULFILLMENT_CHANNEL, "Merchant"),
            shipped_line("701-4", "B"),
        ];
        assert!(build(&records).is_empty());
    }

    #[test]
    fn test_cancelled_and_non_amazon_orders_skipped() {
        let records = [
            with(shipped_line("701-5", "A"), ORDER_STATUS, "cancelled"),
            with(shipped_line("701-6", "A"), SALES_CHANNEL, "Non-Amazon"),
        ];
        assert!(build(&records).is_empty());
    }

    #[test]
    fn test_capitalised_order_status_not_filtered() {
        let records = [with(shipped_line("701-7", "A"), ORDER_STATUS, "Cancelled")];
        let orders = build(&records);
        assert_eq!(orders.len(), 1);
        assert!(orders[0].hold);
    }

    #[test]
    fn test_pending_order_is_held() {
        let orders = build(&[with(shipped_line("701-8", "A"), ORDER_STATUS, "Pending")]);
        assert!(orders[0].hold);
        assert!(!orders[0].udf.shipped);
    }

    #[test]
    fn test_groups_keep_report_order() {
        let records = [
            shipped_line("B", "1"),
            shipped_line("A", "1"),
            shipped_line("B", "2"),
        ];
        let orders = build(&records);
        let refs: Vec<_> = orders.iter().map(|o| o.reference_no.as_str()).collect();
        assert_eq!(refs, ["B", "A"]);
        let skus: Vec<_> = orders[0].items.iter().map(|i| i.part_no.as_str()).collect();
        assert_eq!(skus, ["1", "2"]);
    }

    #[test]
    fn test_freight_sums_net_shipping() {
        let records = [
            with(with(shipped_line("701-9", "A"), SHIPPING_PRICE, "10.0"), SHIP_PROMOTION_DISCOUNT, "2.0"),
            with(with(shipped_line("701-9", "B"), SHIPPING_PRICE, "5.0"), SHIP_PROMOTION_DISCOUNT, "0.0"),
        ];
        assert_eq!(build(&records)[0].freight, "13.0");
    }

    #[test]
    fn test_freight_ignores_bad_discounts() {
        let mut missing = shipped_line("701-10", "B");
        missing.0.remove(SHIP_PROMOTION_DISCOUNT);
        let records = [
            with(with(shipped_line("701-10", "A"), SHIPPING_PRICE, "10.0"), SHIP_PROMOTION_DISCOUNT, "nan"),
            with(missing, SHIPPING_PRICE, "5.0"),
        ];
        assert_eq!(build(&records)[0].freight, "15.0");
    }

    #[test]
    fn test_tax_code_absent_still_annotated() {
        let orders = build(&[with(shipped_line("701-11", "A"), ITEM_PRICE, "0")]);
        assert_eq!(orders[0].shipping_address.sales_taxes, vec![SalesTax { code: None }]);
    }

    #[test]
    fn test_missing_currency_and_bad_date() {
        let mut l = with(shipped_line("701-12", "A"), PURCHASE_DATE, "soon");
        l.0.remove(CURRENCY);
        let orders = build(&[l]);
        assert_eq!(orders[0].currency, None);
        assert_eq!(orders[0].order_date, "");
    }

    #[test]
    fn test_zero_quantity_unit_price_is_zero() {
        let orders = build(&[with(shipped_line("701-13", "A"), QUANTITY, "0")]);
        assert_eq!(orders[0].items[0].unit_price, "0.0");
        assert_eq!(orders[0].items[0].order_qty, "0");
    }

    #[test]
    fn test_defaults_override() {
        let defaults = ImportDefaults { customer_no: "AMZ-CA".into(), warehouse: "FBA1".into(), payment_method: "07".into() };
        let orders = OrderAggregator::new(defaults).build(&[shipped_line("701-14", "A")]);
        assert_eq!(orders[0].customer.customer_no, "AMZ-CA");
        assert_eq!(orders[0].items[0].inventory.whse, "FBA1");
    }

    #[test]
    fn test_serialized_shape() {
        let orders = build(&[shipped_line("701-15", "A")]);
        let json = serde_json::to_value(&orders[0]).unwrap();
        assert_eq!(json["type"], "O");
        assert_eq!(json["referenceNo"], "701-15");
        assert_eq!(json["shippingAddress"]["provState"], "ON");
        assert_eq!(json["shippingAddress"]["salesTaxes"][0]["code"], 3);
        assert_eq!(json["items"][0]["inventory"]["partNo"], "A");
        assert_eq!(json["items"][0]["orderQty"], "2");
        assert_eq!(json["udf"]["shopid"], "701-15");
        assert_eq!(json["customer"]["customerNo"], "AMAZON");
    }
}
