// Page selectors for the booking flow

use serde::{Deserialize, Serialize};

/// Every element the workflow touches, as opaque driver selectors.
///
/// Defaults target the campus venue reservation site (屏峰校区 outdoor
/// tennis courts, half-court mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub username: String,
    pub password: String,
    pub login_button: String,
    /// Appears once login has gone through
    pub login_landmark: String,
    pub category: String,
    pub branch_picker: String,
    pub branch: String,
    pub confirm: String,
    pub resource_type: String,
    pub next: String,
    pub date: String,
    pub mode: String,
    pub agree: String,
    pub reserve: String,
    pub companion_name: String,
    pub companion_phone: String,
    pub pay: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            username: "#username".to_string(),
            password: "#ppassword".to_string(),
            login_button: "#dl".to_string(),
            login_landmark: "text=体育场馆".to_string(),
            category: "text=体育场馆".to_string(),
            branch_picker: ".branch_content".to_string(),
            branch: "text=屏峰校区".to_string(),
            confirm: "text=确认".to_string(),
            resource_type: ".van-radio".to_string(),
            next: "text=下一步".to_string(),
            date: ".wh_item_date:not(.wh_want_dayhide):not(.wh_other_dayhide):not(.wh_isToday)"
                .to_string(),
            mode: ".venue_list .van-radio".to_string(),
            agree: "text=已阅读并同意".to_string(),
            reserve: "text=立即预约".to_string(),
            companion_name: "input[placeholder='请输入姓名']".to_string(),
            companion_phone: "input[placeholder='请输入手机号']".to_string(),
            pay: "button .van-button__text".to_string(),
        }
    }
}
