//! Per-language harness skeletons.
//!
//! Placeholders (`@@NAME@@`) are substituted by [`super::build_harness`]:
//!
//! - `@@IMPORTS@@`: merged import lines of harness, candidate and adapter
//! - `@@CANDIDATE@@`: candidate source with imports removed
//! - `@@ADAPTER@@`: adapter source with imports removed
//! - `@@ENTRY@@`: the expression whose value gets printed

pub const PYTHON: &str = r##"@@IMPORTS@@
import sys as _judge_sys
import json as _judge_json

@@CANDIDATE@@

@@ADAPTER@@


def _judge_decode(token):
    try:
        return _judge_json.loads(token)
    except ValueError:
        return token


def _judge_format(value):
    if isinstance(value, bool):
        return "true" if value else "false"
    if value is None:
        return "null"
    if isinstance(value, (int, float, str)):
        return str(value)
    if isinstance(value, (tuple, set, frozenset)):
        value = list(value)
    return _judge_json.dumps(value, separators=(",", ":"), default=str)


input_data = _judge_sys.stdin.read()
_judge_args = [_judge_decode(t) for t in input_data.split()]
_judge_result = @@ENTRY@@
print(_judge_format(_judge_result))
"##;

pub const PYTHON_ENTRY: &str = "solve(*_judge_args)";
pub const PYTHON_CLASS_ENTRY: &str = "Solution().solve(*_judge_args)";

/// Shared by JavaScript and TypeScript; every binding is typed `any` so the
/// TypeScript compiler accepts it under any `lib` setting.
const SCRIPT_TRAILER: &str = r##"
const __judgeFs: any = eval("require")("fs");
const inputData: string = __judgeFs.readFileSync(0, "utf8");
const __judgeArgs: any[] = inputData
  .split(/\s+/)
  .filter((t: string) => t.length > 0)
  .map((t: string) => {
    try {
      return JSON.parse(t);
    } catch (e) {
      return t;
    }
  });

function __judgeNormalize(_key: any, x: any): any {
  if (x && typeof x === "object" && typeof x.forEach === "function" && typeof x.size === "number") {
    if (typeof x.get === "function") {
      const o: any = {};
      x.forEach((v: any, k: any) => {
        o[String(k)] = v;
      });
      return o;
    }
    const a: any[] = [];
    x.forEach((v: any) => {
      a.push(v);
    });
    return a;
  }
  return x;
}

function __judgeFormat(v: any): string {
  if (v === null || v === undefined) return "null";
  if (typeof v === "string") return v;
  if (typeof v === "number" || typeof v === "boolean" || typeof v === "bigint") return String(v);
  return JSON.stringify(v, __judgeNormalize);
}

const __judgeResult: any = @@ENTRY@@;
if (__judgeResult && typeof __judgeResult.then === "function") {
  __judgeResult.then((r: any) => console.log(__judgeFormat(r)));
} else {
  console.log(__judgeFormat(__judgeResult));
}
"##;

pub fn javascript() -> String {
    // Plain JavaScript is the TypeScript trailer minus the annotations.
    let trailer = strip_ts_annotations(SCRIPT_TRAILER);
    format!("@@IMPORTS@@\n\n@@CANDIDATE@@\n\n@@ADAPTER@@\n{}", trailer)
}

pub fn typescript() -> String {
    format!(
        "@@IMPORTS@@\n\n@@CANDIDATE@@\n\n@@ADAPTER@@\n{}",
        SCRIPT_TRAILER
    )
}

fn strip_ts_annotations(src: &str) -> String {
    src.replace(": any[]", "")
        .replace(": string)", ")")
        .replace(": string =", " =")
        .replace("): string", ")")
        .replace(": any)", ")")
        .replace(": any =", " =")
        .replace(": any,", ",")
        .replace("): any", ")")
}

pub const JAVASCRIPT_ENTRY: &str = "solve(...__judgeArgs)";
pub const JAVASCRIPT_CLASS_ENTRY: &str = "new Solution().solve(...__judgeArgs)";
pub const TYPESCRIPT_ENTRY: &str = "(solve as any)(...__judgeArgs)";
pub const TYPESCRIPT_CLASS_ENTRY: &str = "(new (Solution as any)() as any).solve(...__judgeArgs)";

pub const JAVA: &str = r##"@@IMPORTS@@

@@CANDIDATE@@

@@ADAPTER@@

public class Main {
    static String unquote(String s) {
        if (s.length() >= 2 && s.startsWith("\"") && s.endsWith("\"")) {
            return s.substring(1, s.length() - 1).replace("\\\"", "\"").replace("\\\\", "\\");
        }
        return s;
    }

    static java.util.List<String> splitArray(String token) {
        java.util.List<String> items = new java.util.ArrayList<>();
        String s = token.trim();
        if (s.startsWith("[") && s.endsWith("]")) {
            s = s.substring(1, s.length() - 1);
        }
        int depth = 0;
        boolean quoted = false;
        StringBuilder cur = new StringBuilder();
        for (int i = 0; i < s.length(); i++) {
            char c = s.charAt(i);
            if (c == '"' && (i == 0 || s.charAt(i - 1) != '\\')) quoted = !quoted;
            if (!quoted && (c == '[' || c == '{')) depth++;
            if (!quoted && (c == ']' || c == '}')) depth--;
            if (!quoted && depth == 0 && c == ',') {
                items.add(cur.toString().trim());
                cur.setLength(0);
                continue;
            }
            cur.append(c);
        }
        if (cur.toString().trim().length() > 0) items.add(cur.toString().trim());
        return items;
    }

    static Object decode(String token) {
        String s = token.trim();
        if (s.startsWith("[")) {
            java.util.List<Object> out = new java.util.ArrayList<>();
            for (String item : splitArray(s)) out.add(decode(item));
            return out;
        }
        if (s.equals("true") || s.equals("false")) return Boolean.parseBoolean(s);
        if (s.equals("null")) return null;
        if (s.startsWith("\"")) return unquote(s);
        try {
            return Long.parseLong(s);
        } catch (NumberFormatException e) {
        }
        try {
            return Double.parseDouble(s);
        } catch (NumberFormatException e) {
        }
        return s;
    }

    static Object convert(String token, Class<?> t) {
        if (t == int.class || t == Integer.class) return Integer.parseInt(token);
        if (t == long.class || t == Long.class) return Long.parseLong(token);
        if (t == double.class || t == Double.class) return Double.parseDouble(token);
        if (t == float.class || t == Float.class) return Float.parseFloat(token);
        if (t == boolean.class || t == Boolean.class) return Boolean.parseBoolean(token);
        if (t == char.class || t == Character.class) return unquote(token).charAt(0);
        if (t == String.class) return unquote(token);
        if (t.isArray()) {
            java.util.List<String> items = splitArray(token);
            Object arr = java.lang.reflect.Array.newInstance(t.getComponentType(), items.size());
            for (int i = 0; i < items.size(); i++) {
                java.lang.reflect.Array.set(arr, i, convert(items.get(i), t.getComponentType()));
            }
            return arr;
        }
        return decode(token);
    }

    static String json(Object v) {
        if (v == null) return "null";
        if (v instanceof String || v instanceof Character) {
            return "\"" + v.toString().replace("\\", "\\\\").replace("\"", "\\\"") + "\"";
        }
        if (v instanceof Number || v instanceof Boolean) return v.toString();
        StringBuilder sb = new StringBuilder();
        if (v.getClass().isArray()) {
            sb.append('[');
            int n = java.lang.reflect.Array.getLength(v);
            for (int i = 0; i < n; i++) {
                if (i > 0) sb.append(',');
                sb.append(json(java.lang.reflect.Array.get(v, i)));
            }
            return sb.append(']').toString();
        }
        if (v instanceof java.util.Map) {
            sb.append('{');
            boolean first = true;
            for (java.util.Map.Entry<?, ?> e : ((java.util.Map<?, ?>) v).entrySet()) {
                if (!first) sb.append(',');
                first = false;
                sb.append(json(String.valueOf(e.getKey()))).append(':').append(json(e.getValue()));
            }
            return sb.append('}').toString();
        }
        if (v instanceof Iterable) {
            sb.append('[');
            boolean first = true;
            for (Object item : (Iterable<?>) v) {
                if (!first) sb.append(',');
                first = false;
                sb.append(json(item));
            }
            return sb.append(']').toString();
        }
        return json(v.toString());
    }

    static String format(Object v) {
        if (v == null) return "null";
        if (v instanceof String || v instanceof Character) return v.toString();
        if (v instanceof Number || v instanceof Boolean) return v.toString();
        return json(v);
    }
@@INVOKER@@
    public static void main(String[] args) throws Exception {
        String inputData =
            new String(System.in.readAllBytes(), java.nio.charset.StandardCharsets.UTF_8);
        Object result = @@ENTRY@@;
        System.out.println(format(result));
    }
}
"##;

/// Reflection-based call of `Solution.solve`. Only emitted for the default
/// entry, so adapters are free to not define `Solution` at all.
pub const JAVA_INVOKER: &str = r##"
    static Object invokeSolve(String inputData) throws Exception {
        String trimmed = inputData.trim();
        String[] tokens = trimmed.isEmpty() ? new String[0] : trimmed.split("\\s+");
        Object target = new Solution();
        for (java.lang.reflect.Method m : target.getClass().getDeclaredMethods()) {
            if (!m.getName().equals("solve") || m.getParameterCount() != tokens.length) continue;
            m.setAccessible(true);
            Class<?>[] types = m.getParameterTypes();
            Object[] values = new Object[tokens.length];
            for (int i = 0; i < tokens.length; i++) values[i] = convert(tokens[i], types[i]);
            try {
                boolean isStatic = java.lang.reflect.Modifier.isStatic(m.getModifiers());
                return m.invoke(isStatic ? null : target, values);
            } catch (java.lang.reflect.InvocationTargetException e) {
                Throwable cause = e.getCause();
                if (cause instanceof Exception) throw (Exception) cause;
                if (cause instanceof Error) throw (Error) cause;
                throw e;
            }
        }
        throw new NoSuchMethodException("Solution.solve taking " + tokens.length + " argument(s)");
    }
"##;

pub const JAVA_ENTRY: &str = "invokeSolve(inputData)";

pub const CPP_INCLUDES: &[&str] = &[
    "#include <iostream>",
    "#include <iterator>",
    "#include <map>",
    "#include <sstream>",
    "#include <string>",
    "#include <tuple>",
    "#include <type_traits>",
    "#include <utility>",
    "#include <vector>",
    "using namespace std;",
];

pub const CPP: &str = r##"@@IMPORTS@@

@@CANDIDATE@@

@@ADAPTER@@

namespace judge_harness {

inline std::vector<std::string> split_array(const std::string& token) {
    std::vector<std::string> items;
    std::string s = token;
    if (s.size() >= 2 && s.front() == '[' && s.back() == ']') s = s.substr(1, s.size() - 2);
    int depth = 0;
    bool quoted = false;
    std::string cur;
    for (size_t i = 0; i < s.size(); i++) {
        char c = s[i];
        if (c == '"' && (i == 0 || s[i - 1] != '\\')) quoted = !quoted;
        if (!quoted && (c == '[' || c == '{')) depth++;
        if (!quoted && (c == ']' || c == '}')) depth--;
        if (!quoted && depth == 0 && c == ',') {
            items.push_back(cur);
            cur.clear();
            continue;
        }
        cur.push_back(c);
    }
    if (!cur.empty()) items.push_back(cur);
    return items;
}

template <typename T>
struct reader {
    static T read(std::istream& in) {
        T value{};
        in >> value;
        return value;
    }
};

template <>
struct reader<bool> {
    static bool read(std::istream& in) {
        std::string s;
        in >> s;
        return s == "true" || s == "1";
    }
};

template <>
struct reader<std::string> {
    static std::string read(std::istream& in) {
        std::string s;
        in >> s;
        if (s.size() >= 2 && s.front() == '"' && s.back() == '"') s = s.substr(1, s.size() - 2);
        return s;
    }
};

template <typename T>
struct reader<std::vector<T>> {
    static std::vector<T> read(std::istream& in) {
        std::string token;
        in >> token;
        std::vector<T> out;
        for (const std::string& item : split_array(token)) {
            std::istringstream item_in(item);
            out.push_back(reader<T>::read(item_in));
        }
        return out;
    }
};

template <typename R, typename... Args>
R invoke(R (*fn)(Args...), std::istream& in) {
    std::tuple<std::decay_t<Args>...> args{reader<std::decay_t<Args>>::read(in)...};
    return std::apply(fn, args);
}

template <typename C, typename R, typename... Args>
R invoke_member(R (C::*fn)(Args...), std::istream& in) {
    C target{};
    std::tuple<std::decay_t<Args>...> args{reader<std::decay_t<Args>>::read(in)...};
    return std::apply([&](auto&... a) { return (target.*fn)(a...); }, args);
}

template <typename C, typename R, typename... Args>
R invoke_member(R (C::*fn)(Args...) const, std::istream& in) {
    const C target{};
    std::tuple<std::decay_t<Args>...> args{reader<std::decay_t<Args>>::read(in)...};
    return std::apply([&](auto&... a) { return (target.*fn)(a...); }, args);
}

inline void write_json(std::ostream& out, const std::string& s);
inline void write_json(std::ostream& out, const char* s);
inline void write_json(std::ostream& out, bool b);
inline void write_json(std::ostream& out, char c);
template <typename T>
std::enable_if_t<std::is_arithmetic<T>::value> write_json(std::ostream& out, T v);
template <typename T>
void write_json(std::ostream& out, const std::vector<T>& v);
template <typename K, typename V>
void write_json(std::ostream& out, const std::map<K, V>& m);
template <typename A, typename B>
void write_json(std::ostream& out, const std::pair<A, B>& p);

inline void write_json(std::ostream& out, const std::string& s) {
    out << '"';
    for (char c : s) {
        if (c == '"' || c == '\\') out << '\\';
        out << c;
    }
    out << '"';
}

inline void write_json(std::ostream& out, const char* s) { write_json(out, std::string(s)); }

inline void write_json(std::ostream& out, bool b) { out << (b ? "true" : "false"); }

inline void write_json(std::ostream& out, char c) { write_json(out, std::string(1, c)); }

template <typename T>
std::enable_if_t<std::is_arithmetic<T>::value> write_json(std::ostream& out, T v) {
    out << v;
}

template <typename T>
void write_json(std::ostream& out, const std::vector<T>& v) {
    out << '[';
    for (size_t i = 0; i < v.size(); i++) {
        if (i > 0) out << ',';
        write_json(out, v[i]);
    }
    out << ']';
}

template <typename K, typename V>
void write_json(std::ostream& out, const std::map<K, V>& m) {
    out << '{';
    bool first = true;
    for (const auto& kv : m) {
        if (!first) out << ',';
        first = false;
        std::ostringstream key;
        key << kv.first;
        write_json(out, key.str());
        out << ':';
        write_json(out, kv.second);
    }
    out << '}';
}

template <typename A, typename B>
void write_json(std::ostream& out, const std::pair<A, B>& p) {
    out << '[';
    write_json(out, p.first);
    out << ',';
    write_json(out, p.second);
    out << ']';
}

inline void write_value(std::ostream& out, const std::string& s) { out << s; }

inline void write_value(std::ostream& out, const char* s) { out << s; }

inline void write_value(std::ostream& out, char c) { out << c; }

template <typename T>
void write_value(std::ostream& out, const T& v) {
    write_json(out, v);
}

}  // namespace judge_harness

int main() {
    std::ios::sync_with_stdio(false);
    std::string input_data((std::istreambuf_iterator<char>(std::cin)),
                           std::istreambuf_iterator<char>());
    std::istringstream judge_in(input_data);
    auto judge_result = @@ENTRY@@;
    judge_harness::write_value(std::cout, judge_result);
    std::cout << std::endl;
    return 0;
}
"##;

pub const CPP_ENTRY: &str = "judge_harness::invoke(solve, judge_in)";
pub const CPP_CLASS_ENTRY: &str = "judge_harness::invoke_member(&Solution::solve, judge_in)";

pub const GO_IMPORTS: &[&str] = &[
    "\"bufio\"",
    "\"encoding/json\"",
    "\"fmt\"",
    "\"io/ioutil\"",
    "\"os\"",
    "\"reflect\"",
    "\"strings\"",
];

pub const GO: &str = r##"package main

import (
@@IMPORTS@@
)

@@CANDIDATE@@

@@ADAPTER@@

func judgeDecode(token string, t reflect.Type) reflect.Value {
	ptr := reflect.New(t)
	if err := json.Unmarshal([]byte(token), ptr.Interface()); err != nil {
		if t.Kind() != reflect.String {
			panic(fmt.Sprintf("cannot decode %q as %s: %v", token, t, err))
		}
		ptr.Elem().SetString(token)
	}
	return ptr.Elem()
}

func judgeInvoke(fn interface{}, inputData string) interface{} {
	v := reflect.ValueOf(fn)
	t := v.Type()
	tokens := strings.Fields(inputData)
	if len(tokens) != t.NumIn() {
		panic(fmt.Sprintf("solve expects %d argument(s), got %d", t.NumIn(), len(tokens)))
	}
	args := make([]reflect.Value, len(tokens))
	for i, tok := range tokens {
		args[i] = judgeDecode(tok, t.In(i))
	}
	out := v.Call(args)
	if len(out) == 0 {
		return nil
	}
	return out[0].Interface()
}

func judgeFormat(v interface{}) string {
	switch x := v.(type) {
	case nil:
		return "null"
	case string:
		return x
	case bool, int, int8, int16, int32, int64, uint, uint8, uint16, uint32, uint64, float32, float64:
		return fmt.Sprint(x)
	}
	b, err := json.Marshal(v)
	if err != nil {
		return fmt.Sprint(v)
	}
	return string(b)
}

func main() {
	raw, err := ioutil.ReadAll(bufio.NewReader(os.Stdin))
	if err != nil {
		panic(err)
	}
	inputData := string(raw)
	_ = inputData
	result := @@ENTRY@@
	fmt.Println(judgeFormat(result))
}
"##;

pub const GO_ENTRY: &str = "judgeInvoke(solve, inputData)";
