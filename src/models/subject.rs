/// 科目枚举
///
/// 判别值即考试局的科目代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u16)]
pub enum Subject {
    /// 数学
    Mathematics = 9709,
    /// 进阶数学
    FurtherMathematics = 9231,
    /// 物理
    Physics = 9702,
    /// 化学
    Chemistry = 9701,
    /// 生物
    Biology = 9700,
    /// 经济
    Economics = 9708,
    /// 计算机科学
    ComputerScience = 9618,
    /// 社会学
    Sociology = 9699,
    /// 心理学
    Psychology = 9990,
    /// 会计
    Accounting = 9706,
    /// 商务
    BusinessStudies = 9609,
}

const NINE_VARIANTS: &[u8] = &[11, 12, 13, 21, 22, 23, 31, 32, 33];
const TWELVE_VARIANTS: &[u8] = &[11, 12, 13, 21, 22, 23, 31, 32, 33, 41, 42, 43];
const FIFTEEN_VARIANTS: &[u8] = &[
    11, 12, 13, 21, 22, 23, 31, 32, 33, 41, 42, 43, 51, 52, 53,
];
const MATHEMATICS_VARIANTS: &[u8] = &[
    11, 12, 13, 21, 22, 23, 31, 32, 33, 41, 42, 43, 51, 52, 53, 61, 62, 63,
];

impl Subject {
    /// 目录中的全部科目
    pub fn all() -> &'static [Subject] {
        &[
            Subject::Mathematics,
            Subject::FurtherMathematics,
            Subject::Physics,
            Subject::Chemistry,
            Subject::Biology,
            Subject::Economics,
            Subject::ComputerScience,
            Subject::Sociology,
            Subject::Psychology,
            Subject::Accounting,
            Subject::BusinessStudies,
        ]
    }

    /// 获取科目代码
    pub fn code(self) -> u16 {
        self as u16
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::FurtherMathematics => "Further Mathematics",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Biology => "Biology",
            Subject::Economics => "Economics",
            Subject::ComputerScience => "Computer Science",
            Subject::Sociology => "Sociology",
            Subject::Psychology => "Psychology",
            Subject::Accounting => "Accounting",
            Subject::BusinessStudies => "Business Studies",
        }
    }

    /// 从代码解析科目
    pub fn from_code(code: u16) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.code() == code)
    }

    /// 从 4 位字符串代码解析科目
    pub fn from_code_str(code: &str) -> Option<Self> {
        if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        code.parse().ok().and_then(Self::from_code)
    }

    /// 目录中列出的卷别数字
    pub fn variants(self) -> &'static [u8] {
        match self {
            Subject::Mathematics => MATHEMATICS_VARIANTS,
            Subject::Physics | Subject::Chemistry | Subject::Biology => FIFTEEN_VARIANTS,
            Subject::FurtherMathematics | Subject::Economics | Subject::ComputerScience => {
                TWELVE_VARIANTS
            }
            Subject::Sociology
            | Subject::Psychology
            | Subject::Accounting
            | Subject::BusinessStudies => NINE_VARIANTS,
        }
    }

    /// 卷别（如 `p42`）是否在目录中
    pub fn lists_variant(self, paper_variant: &str) -> bool {
        crate::models::variant_number(paper_variant)
            .and_then(|n| u8::try_from(n).ok())
            .is_some_and(|n| self.variants().contains(&n))
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
