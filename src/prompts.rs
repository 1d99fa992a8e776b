pub const REFINE_SYSTEM: &str = include_str!("../data/prompts/refine_system.txt");
pub const REFINE_USER: &str = include_str!("../data/prompts/refine_user.txt");
pub const CATEGORY_BACKGROUND: &str = include_str!("../data/prompts/category_background.txt");
pub const ANALYZE_PRODUCT: &str = include_str!("../data/prompts/analyze_product.txt");
pub const DESCRIPTION_SYSTEM_TR: &str = include_str!("../data/prompts/description_system_tr.txt");
pub const DESCRIPTION_SYSTEM_EN: &str = include_str!("../data/prompts/description_system_en.txt");
pub const KIT_SYSTEM_TR: &str = include_str!("../data/prompts/kit_system_tr.txt");
pub const KIT_SYSTEM_EN: &str = include_str!("../data/prompts/kit_system_en.txt");
pub const KIT_USER_TR: &str = include_str!("../data/prompts/kit_user_tr.txt");
pub const KIT_USER_EN: &str = include_str!("../data/prompts/kit_user_en.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
