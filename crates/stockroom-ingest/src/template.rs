//! Downloadable sample catalog.

/// Header row plus two example rows. Kept in step with `validator`.
pub const CATALOG_TEMPLATE_CSV: &str = "\
name,price,description,category,brand,quantity,sku,compatibility,image
Alloy Rim 17in,249.99,Lightweight 17 inch alloy rim,wheels,Forgeline,4,RIM001,Honda Civic 2016-2021,rim1.jpg
Carbon Rear Spoiler,189.00,Gloss carbon fibre rear spoiler,body,Seibon,2,SPL002,Subaru WRX 2015-2021,spoiler.jpg
";

pub const CATALOG_TEMPLATE_FILENAME: &str = "catalog_template.csv";
