// Table, file and column constants shared across the pipeline.
//
// Each schema lists `(source key, output column)` pairs in output order.
// Source keys are the flattened keys produced by `flatten`.

// Input files, relative to the data directory
pub const RECEIPTS_FILE: &str = "receipts.json";
pub const BRANDS_FILE: &str = "brands.json";
pub const USERS_FILE: &str = "users.json";

// Final table names, also used as output directory and file stems
pub const RECEIPTS_TABLE: &str = "receipts";
pub const LINE_ITEMS_TABLE: &str = "line_items";
pub const USERS_TABLE: &str = "users";
pub const BRANDS_TABLE: &str = "brands";
pub const BONUS_POINT_REASONS_TABLE: &str = "bonus_point_reasons";

// Receipt keys read by the extractor
pub const RECEIPT_ID_KEY: &str = "_id";
pub const OID_KEY: &str = "$oid";
pub const ITEM_LIST_KEY: &str = "rewardsReceiptItemList";
pub const BONUS_REASON_KEY: &str = "bonusPointsEarnedReason";
pub const BONUS_REASON_SEPARATOR: &str = ", ";
pub const PARTNER_ITEM_ID_KEY: &str = "partnerItemId";

// Keys the extractor adds to derived records
pub const RECEIPT_ID_FIELD: &str = "receipt_id";
pub const BONUS_REASON_FIELD: &str = "bonus_points_earned_reason";
pub const LINE_ITEM_ID_FIELD: &str = "line_item_id";

/// Root keys left out of receipt flattening; the extractor handles them
pub const RECEIPT_ROOT_KEYS_TO_IGNORE: &[&str] = &[ITEM_LIST_KEY, BONUS_REASON_KEY];

pub const RECEIPT_COLUMNS: &[(&str, &str)] = &[
    ("_id_$oid", "receipt_id"),
    ("bonusPointsEarned", "bonus_points_earned"),
    ("createDate_$date", "created_date"),
    ("dateScanned_$date", "scanned_date"),
    ("finishedDate_$date", "finished_date"),
    ("modifyDate_$date", "modified_date"),
    ("pointsAwardedDate_$date", "points_awarded_date"),
    ("pointsEarned", "points_earned"),
    ("purchaseDate_$date", "purchased_date"),
    ("purchasedItemCount", "purchased_item_count"),
    ("rewardsReceiptStatus", "rewards_receipt_status"),
    ("totalSpent", "total_spent"),
    ("userId", "user_id"),
];

pub const RECEIPT_TIMESTAMP_COLUMNS: &[&str] = &[
    "created_date",
    "scanned_date",
    "finished_date",
    "modified_date",
    "points_awarded_date",
    "purchased_date",
];

pub const LINE_ITEM_COLUMNS: &[(&str, &str)] = &[
    ("barcode", "barcode"),
    ("description", "description"),
    ("finalPrice", "final_price"),
    ("itemPrice", "item_price"),
    ("needsFetchReview", "needs_fetch_review"),
    ("partnerItemId", "partner_item_id"),
    ("preventTargetGapPoints", "prevent_target_gap_points"),
    ("quantityPurchased", "quantity_purchased"),
    ("userFlaggedBarcode", "user_flagged_barcode"),
    ("userFlaggedNewItem", "user_flagged_new_item"),
    ("userFlaggedPrice", "user_flagged_price"),
    ("userFlaggedQuantity", "user_flagged_quantity"),
    ("receipt_id", "receipt_id"),
    ("needsFetchReviewReason", "needs_fetch_review_reason"),
    ("pointsNotAwardedReason", "points_not_awarded_reason"),
    ("pointsPayerId", "points_payer_id"),
    ("rewardsGroup", "rewards_group"),
    ("rewardsProductPartnerId", "rewards_product_partner_id"),
    ("userFlaggedDescription", "user_flagged_description"),
    ("originalMetaBriteBarcode", "original_metabrite_barcode"),
    ("originalMetaBriteDescription", "original_metabrite_description"),
    ("brandCode", "brand_code"),
    ("competitorRewardsGroup", "competitor_rewards_group"),
    ("discountedItemPrice", "discounted_item_price"),
    ("originalReceiptItemText", "original_receipt_item_text"),
    ("itemNumber", "item_number"),
    ("originalMetaBriteQuantityPurchased", "original_metabrite_quantity_purchased"),
    ("pointsEarned", "points_earned"),
    ("targetPrice", "target_price"),
    ("competitiveProduct", "competitive_product"),
    ("originalFinalPrice", "original_final_price"),
    ("originalMetaBriteItemPrice", "original_metabrite_item_price"),
    ("deleted", "deleted"),
    ("priceAfterCoupon", "price_after_coupon"),
    ("metabriteCampaignId", "metabrite_campaign_id"),
    ("line_item_id", "line_item_id"),
];

pub const BRAND_COLUMNS: &[(&str, &str)] = &[
    ("_id_$oid", "brand_id"),
    ("barcode", "barcode"),
    ("category", "category"),
    ("categoryCode", "category_code"),
    ("cpg_$id_$oid", "cpg_id"),
    ("cpg_$ref", "cpg_ref"),
    ("name", "name"),
    ("topBrand", "top_brand"),
    ("brandCode", "brand_code"),
];

pub const USER_COLUMNS: &[(&str, &str)] = &[
    ("_id_$oid", "user_id"),
    ("active", "active"),
    ("createdDate_$date", "created_date"),
    ("lastLogin_$date", "last_login"),
    ("role", "role"),
    ("signUpSource", "sign_up_source"),
    ("state", "state"),
];

pub const USER_TIMESTAMP_COLUMNS: &[&str] = &["created_date", "last_login"];

pub const BONUS_POINT_REASON_COLUMNS: &[(&str, &str)] = &[
    (RECEIPT_ID_FIELD, "receipt_id"),
    (BONUS_REASON_FIELD, "bonus_points_earned_reason"),
];
