//! Built-in error message catalogues keyed by stringified error code.

use std::collections::HashMap;

use crate::domain::ports::Translator;
use crate::domain::{
    COMMON_BAD_REQUEST, COMMON_DB_ERROR, COMMON_DUPLICATE, COMMON_INTERNAL_ERROR,
    COMMON_INVALID_PARAM, COMMON_NO_PERMISSION, COMMON_RATE_LIMITED, COMMON_RESOURCE_NOT_FOUND,
    COMMON_RPC_ERROR, COMMON_UNAUTHORIZED, Locale, USER_EMAIL_EXIST, USER_PASSWORD_WRONG,
    USER_REGISTRATION_BLOCKED, USER_UNIQUE_NAME_EXIST,
};

const EN_US: &[(i32, &str)] = &[
    (COMMON_INTERNAL_ERROR, "Service internal error, please try again later"),
    (COMMON_BAD_REQUEST, "The request is malformed"),
    (COMMON_INVALID_PARAM, "Invalid parameter"),
    (COMMON_UNAUTHORIZED, "Please sign in first"),
    (COMMON_NO_PERMISSION, "You do not have permission for this operation"),
    (COMMON_RESOURCE_NOT_FOUND, "The resource does not exist"),
    (COMMON_DUPLICATE, "The resource already exists"),
    (COMMON_RATE_LIMITED, "Too many requests, please slow down"),
    (COMMON_DB_ERROR, "Storage is temporarily unavailable"),
    (COMMON_RPC_ERROR, "A dependent service is unavailable"),
    (USER_REGISTRATION_BLOCKED, "Registration is currently closed"),
    (USER_EMAIL_EXIST, "This email is already registered"),
    (USER_UNIQUE_NAME_EXIST, "This username is already taken"),
    (USER_PASSWORD_WRONG, "Incorrect email or password"),
];

const ZH_CN: &[(i32, &str)] = &[
    (COMMON_INTERNAL_ERROR, "服务内部错误，请稍后重试"),
    (COMMON_BAD_REQUEST, "请求格式错误"),
    (COMMON_INVALID_PARAM, "参数错误"),
    (COMMON_UNAUTHORIZED, "请先登录"),
    (COMMON_NO_PERMISSION, "没有操作权限"),
    (COMMON_RESOURCE_NOT_FOUND, "资源不存在"),
    (COMMON_DUPLICATE, "资源已存在"),
    (COMMON_RATE_LIMITED, "请求过于频繁"),
    (COMMON_DB_ERROR, "存储服务暂不可用"),
    (COMMON_RPC_ERROR, "依赖服务不可用"),
    (USER_REGISTRATION_BLOCKED, "当前未开放注册"),
    (USER_EMAIL_EXIST, "该邮箱已被注册"),
    (USER_UNIQUE_NAME_EXIST, "该用户名已被占用"),
    (USER_PASSWORD_WRONG, "邮箱或密码错误"),
];

/// Translator over the built-in `en-us` and `zh-cn` catalogues.
#[derive(Debug, Clone)]
pub struct StaticTranslator {
    catalogues: HashMap<&'static str, HashMap<String, &'static str>>,
}

impl StaticTranslator {
    pub fn new() -> Self {
        let catalogue = |entries: &[(i32, &'static str)]| {
            entries
                .iter()
                .map(|(code, text)| (code.to_string(), *text))
                .collect::<HashMap<_, _>>()
        };
        Self {
            catalogues: HashMap::from([("en-us", catalogue(EN_US)), ("zh-cn", catalogue(ZH_CN))]),
        }
    }
}

impl Default for StaticTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for StaticTranslator {
    fn translate(&self, key: &str, locale: &Locale) -> Option<String> {
        self.catalogues
            .get(locale.catalogue_key().as_str())
            .and_then(|entries| entries.get(key))
            .map(|text| (*text).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("zh-CN", "邮箱或密码错误")]
    #[case("ZH-cn", "邮箱或密码错误")]
    #[case("en-US", "Incorrect email or password")]
    fn lookups_ignore_locale_case(#[case] locale: &str, #[case] expected: &str) {
        let translator = StaticTranslator::new();
        let text = translator.translate(
            &USER_PASSWORD_WRONG.to_string(),
            &Locale::resolve(Some(locale)),
        );
        assert_eq!(text.as_deref(), Some(expected));
    }

    #[rstest]
    fn unknown_codes_miss() {
        let translator = StaticTranslator::new();
        assert!(translator.translate("1001", &Locale::default()).is_none());
    }

    #[rstest]
    fn catalogues_cover_the_same_codes() {
        let mut en: Vec<i32> = EN_US.iter().map(|(code, _)| *code).collect();
        let mut zh: Vec<i32> = ZH_CN.iter().map(|(code, _)| *code).collect();
        en.sort_unstable();
        zh.sort_unstable();
        assert_eq!(en, zh);
    }
}
