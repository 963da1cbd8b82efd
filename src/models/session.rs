use serde::{Deserialize, Serialize};

/// 考试季
///
/// 排序使用 [`Session::rank`]：FM < MJ < ND
// 与考试局的考试季缩写保持一致
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    /// 二/三月
    FM,
    /// 五/六月
    MJ,
    /// 十/十一月
    ND,
}

impl Session {
    /// 全部考试季，按年内先后排列
    pub const ALL: [Session; 3] = [Session::FM, Session::MJ, Session::ND];

    /// 从文件名中的单字母代码解析（不区分大小写）
    ///
    /// `s` → FM，`m` → MJ，`w` → ND，其余返回 `None`
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_lowercase() {
            's' => Some(Session::FM),
            'm' => Some(Session::MJ),
            'w' => Some(Session::ND),
            _ => None,
        }
    }

    /// 文件名中使用的单字母代码
    pub fn code(self) -> char {
        match self {
            Session::FM => 's',
            Session::MJ => 'm',
            Session::ND => 'w',
        }
    }

    /// 年内排序值
    pub fn rank(self) -> u8 {
        match self {
            Session::FM => 0,
            Session::MJ => 1,
            Session::ND => 2,
        }
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Session::FM => "FM",
            Session::MJ => "MJ",
            Session::ND => "ND",
        }
    }

    /// 考试月份描述
    pub fn months(self) -> &'static str {
        match self {
            Session::FM => "Feb/Mar",
            Session::MJ => "May/Jun",
            Session::ND => "Oct/Nov",
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_is_case_insensitive() {
        assert_eq!(Session::from_code('s'), Some(Session::FM));
        assert_eq!(Session::from_code('M'), Some(Session::MJ));
        assert_eq!(Session::from_code('w'), Some(Session::ND));
        assert_eq!(Session::from_code('x'), None);
    }

    #[test]
    fn test_code_matches_from_code() {
        for session in Session::ALL {
            assert_eq!(Session::from_code(session.code()), Some(session));
        }
    }

    #[test]
    fn test_rank_follows_calendar() {
        let ranks: Vec<u8> = Session::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }
}
