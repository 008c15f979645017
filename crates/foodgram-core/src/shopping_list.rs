use crate::models::ShoppingListItem;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";
const HEADER: &str = "Shopping list:";

/// Render aggregated items as the downloadable text file.
///
/// One `"<name> - <amount> <unit>."` line per item, in the given order.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut out = String::from(HEADER);
    for item in items {
        out.push('\n');
        out.push_str(&format!(
            "{} - {} {}.",
            item.name, item.total_amount, item.measurement_unit
        ));
    }
    out
}
